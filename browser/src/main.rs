use log::error;

fn main() {
  match mhbrowse_lib::err_main(None, None) {
    Err(e) => error!("error: {:?}", e),
    Ok(_) => (),
  }
}
