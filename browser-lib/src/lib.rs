pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod render;
pub mod state;
pub mod util;

use crate::error as mherr;
use api::ApiClient;
use clap::Arg;
use config::Config;
use fetch::Session;
use log::info;
use mhprotocol::content::BugReport;
use mhprotocol::params::SearchParams;
use mhprotocol::search::{allowed_operators, AndOr, Operator, SortOrder};
use state::Display;
use std::error::Error;
use std::fs::File;
use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};

pub fn defcon() -> Config {
  Config {
    api_url: "https://mhcut-browser.genap.ca/api".to_string(),
    dataset: "cas".to_string(),
    items_per_page: 100,
    export_dir: PathBuf::from("./exports"),
  }
}

pub fn load_config(filename: &str) -> Result<Config, Box<dyn Error>> {
  info!("loading config: {}", filename);
  let c = toml::from_str(
    util::load_string(filename)
      .map_err(|e| {
        mherr::annotate_string(
          format!("failed to load config: '{}'", filename),
          mherr::Error::String(e.to_string()),
        )
      })?
      .as_str(),
  )?;
  Ok(c)
}

/// The parameter set of a fresh, unfiltered session; used for one-shot
/// exports that never talk to the metadata endpoint.
fn default_search_params() -> SearchParams {
  SearchParams {
    sort_by: "id".to_string(),
    sort_order: SortOrder::Asc,
    chr: None,
    start: 0,
    end: 1000000000000,
    location: Vec::new(),
    min_mh_1l: state::DEFAULT_MIN_MH_1L,
    clinvar: false,
    ngg_pam_avail: false,
    unique_guide_avail: false,
    search_query: "".to_string(),
  }
}

#[tokio::main]
pub async fn err_main(
  oconfig: Option<Config>,
  logfile: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
  let matches = clap::Command::new("mhbrowse")
    .version("1.0")
    .about("terminal browser for the MHcut variants/guides API")
    .arg(
      Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("specify config file"),
    )
    .arg(
      Arg::new("write_config")
        .short('w')
        .long("write_config")
        .value_name("FILE")
        .help("write default config file"),
    )
    .arg(
      Arg::new("url")
        .short('u')
        .long("url")
        .value_name("URL")
        .help("API base url, overriding the config"),
    )
    .arg(
      Arg::new("dataset")
        .short('d')
        .long("dataset")
        .value_name("DATASET")
        .help("dataset id, overriding the config"),
    )
    .arg(
      Arg::new("export")
        .short('e')
        .long("export")
        .value_name("FILE")
        .help("export the unfiltered variants table to a tsv file and exit"),
    )
    .arg(
      Arg::new("log_file")
        .long("log_file")
        .value_name("FILE")
        .help("log to a file instead of stderr"),
    )
    .get_matches();

  match logfile.or_else(|| matches.get_one::<String>("log_file").map(PathBuf::from)) {
    Some(lf) => {
      let target = Box::new(File::create(lf)?);
      env_logger::Builder::new()
        .target(env_logger::Target::Pipe(target))
        .filter(None, log::LevelFilter::Debug)
        .init();
    }
    None => env_logger::init(),
  };

  // writing a config file?
  if let Some(filename) = matches.get_one::<String>("write_config") {
    util::write_string(filename, toml::to_string_pretty(&defcon())?.as_str())?;
    info!("default config written to file: {}", filename);
    return Ok(());
  }

  // passed-in config gets priority; then an explicit config file; then
  // config.toml if present; then the built-in defaults.
  let mut config = match oconfig {
    Some(c) => c,
    None => match matches.get_one::<String>("config") {
      Some(filename) => load_config(filename)?,
      None => match load_config("config.toml") {
        Ok(c) => c,
        Err(_) => defcon(),
      },
    },
  };

  if let Some(url) = matches.get_one::<String>("url") {
    config.api_url = url.clone();
  }
  if let Some(ds) = matches.get_one::<String>("dataset") {
    config.dataset = ds.clone();
  }

  // one-shot export?
  if let Some(exportfile) = matches.get_one::<String>("export") {
    let api = ApiClient::new(config.api_url.as_str(), config.dataset.as_str())?;
    let url = api.variants_tsv_url(&default_search_params())?;
    api.download_tsv(url, Path::new(exportfile)).await?;
    println!("variants exported to {}", exportfile);
    return Ok(());
  }

  // interactive browsing is the default.
  let mut session = Session::connect(&config).await?;
  print!("{}", render::render(&session.state));
  println!("'help' lists commands.");

  loop {
    print!("> ");
    stdout().flush()?;
    let mut line = String::new();
    if stdin().read_line(&mut line)? == 0 {
      break;
    }
    match run_command(&mut session, &config, line.trim()).await {
      Ok(true) => break,
      Ok(false) => (),
      Err(e) => println!("error: {:?}", e),
    }
  }

  Ok(())
}

fn parse_operator(s: &str) -> Option<Operator> {
  serde_json::from_str::<Operator>(format!("\"{}\"", s).as_str()).ok()
}

const HELP: &str = "\
pages:     n / p / f / l, page <n>, ipp <n>
view:      view variants|guides, sort <column>, fields, refresh
datasets:  datasets, dataset <id>
filters:   pos <chr[:start-end]>, loc <a,b,..>, minmh <n>,
           clinvar|pam|uniq on|off, apply, clear
search:    cond add, cond rm <id>, cond bool <id> and|or,
           cond set <id> [not] <field> <operator> [value],
           conds, ops <field>, save
detail:    guides <variant_id>
export:    export variants|guides|combined [file]
           export vguides <variant_id> [file]
misc:      report <email>, help, q";

/// Applies one command line to the session.  Returns true to quit.  User
/// mistakes print a message and leave the state alone; only transport-level
/// failures surface as errors.
async fn run_command(
  session: &mut Session,
  config: &Config,
  line: &str,
) -> Result<bool, mherr::Error> {
  let words: Vec<&str> = line.split_whitespace().collect();
  let mut rerender = false;

  match words.as_slice() {
    [] => (),
    ["q"] | ["quit"] => return Ok(true),
    ["help"] => println!("{}", HELP),

    // paging; counts are already known, so no recount
    ["n"] => {
      session.state = session.state.clone().next_page();
      session.reload(false).await;
      rerender = true;
    }
    ["p"] => {
      session.state = session.state.clone().prev_page();
      session.reload(false).await;
      rerender = true;
    }
    ["f"] => {
      session.state = session.state.clone().first_page();
      session.reload(false).await;
      rerender = true;
    }
    ["l"] => {
      session.state = session.state.clone().last_page();
      session.reload(false).await;
      rerender = true;
    }
    ["page", n] => match n.parse::<i64>() {
      Ok(n) => {
        session.state = session.state.clone().with_page(n);
        session.reload(false).await;
        rerender = true;
      }
      Err(_) => println!("not a page number: {}", n),
    },
    ["ipp", n] => {
      let n = n.parse::<i64>().unwrap_or(0);
      session.state = session.state.clone().set_items_per_page(n);
      session.reload(false).await;
      rerender = true;
    }

    ["sort", column] => {
      if session.state.fields.contains_key(*column) {
        session.state = session.state.clone().toggle_sort(column);
        session.reload(false).await;
        rerender = true;
      } else {
        println!("unknown column: {}", column);
      }
    }

    ["view", "variants"] => {
      session.state.display = Display::Variants;
      rerender = true;
    }
    ["view", "guides"] => {
      session.state.display = Display::Guides;
      rerender = true;
    }

    ["datasets"] => {
      for d in session.api.datasets().await? {
        println!("{}  {}", d.id, d.name);
      }
    }
    ["dataset", ds] => {
      // a dataset has its own bounds and fields, so start the session over
      let mut c = config.clone();
      c.dataset = ds.to_string();
      *session = Session::connect(&c).await?;
      rerender = true;
    }

    ["fields"] => {
      for (name, fm) in &session.state.fields {
        println!(
          "{}  ({}{})",
          name,
          fm.data_type,
          if fm.nullable() { ", nullable" } else { "" }
        );
      }
    }

    ["refresh"] => {
      session.reload(true).await;
      rerender = true;
    }

    // quick filters; nothing is fetched until 'apply'
    ["pos", rest @ ..] => {
      session.state = session.state.clone().set_position_query(&rest.join(" "));
      match session.state.chr {
        Some(ref chr) => println!(
          "position filter: {}:{}-{}",
          chr, session.state.start_pos, session.state.end_pos
        ),
        None => println!("position filter cleared"),
      }
    }
    ["loc", list] => {
      let locations: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();
      session.state = session.state.clone().set_locations(&locations);
      println!("locations: {}", session.state.locations.join(","));
    }
    ["minmh", n] => {
      session.state = session.state.clone().set_min_mh_1l(n);
      println!("min mh_1l: {}", session.state.min_mh_1l);
    }
    ["clinvar", flag @ ("on" | "off")] => {
      session.state.clinvar = *flag == "on";
    }
    ["pam", flag @ ("on" | "off")] => {
      session.state.ngg_pam_avail = *flag == "on";
    }
    ["uniq", flag @ ("on" | "off")] => {
      session.state.unique_guide_avail = *flag == "on";
    }

    ["apply"] => {
      session.state = session.state.clone().save_search().first_page();
      session.reload(true).await;
      rerender = true;
    }
    ["clear"] => {
      session.state = session.state.clone().reset_filters().first_page();
      session.reload(true).await;
      rerender = true;
    }

    // advanced search conditions
    ["cond", "add"] => {
      let id = session.state.filters.add();
      println!("condition {} added", id);
    }
    ["cond", "rm", id] => match id.parse::<i64>() {
      Ok(id) => session.state.filters.remove(id),
      Err(_) => println!("not a condition id: {}", id),
    },
    ["cond", "bool", id, b @ ("and" | "or")] => {
      match id
        .parse::<i64>()
        .ok()
        .and_then(|id| session.state.filters.get_mut(id))
      {
        Some(c) => {
          c.boolean = if *b == "and" { AndOr::And } else { AndOr::Or };
        }
        None => println!("no condition with id {}", id),
      }
    }
    ["cond", "set", id, rest @ ..] => {
      set_condition(&mut session.state, id, rest);
    }
    ["conds"] => {
      if session.state.filters.is_empty() {
        println!("no conditions");
      }
      for (i, c) in session.state.filters.conditions().iter().enumerate() {
        println!(
          "{}: {}{}{} {} {:?}",
          c.id,
          if i > 0 {
            format!("{:?} ", c.boolean).to_uppercase()
          } else {
            "".to_string()
          },
          if c.negated { "NOT " } else { "" },
          if c.field.is_empty() {
            "<field>"
          } else {
            c.field.as_str()
          },
          c.operator,
          c.value
        );
      }
    }
    ["ops", field] => {
      let ops = allowed_operators(session.state.field_meta(field));
      let names: Vec<&str> = ops.iter().map(|o| o.as_str()).collect();
      println!("{}", names.join(" "));
    }
    ["save"] => {
      session.state = session.state.clone().save_search();
      println!("search query: {}", session.state.search_query);
    }

    // per-variant guide detail
    ["guides", id] => match id.parse::<i64>() {
      Ok(id) => {
        let guides = session.api.variant_guides(id).await?;
        print!("{}", render::render_table(&guides, &render::GUIDE_COLUMNS));
      }
      Err(_) => println!("not a variant id: {}", id),
    },

    // exports
    ["export", what @ ("variants" | "guides" | "combined"), rest @ ..] => {
      let search = session.state.search_params();
      let url = match *what {
        "variants" => session.api.variants_tsv_url(&search)?,
        "guides" => session.api.guides_tsv_url(&search, true)?,
        _ => session.api.combined_tsv_url(&search, true)?,
      };
      let dest = export_dest(config, rest, format!("{}.tsv", what).as_str())?;
      session.api.download_tsv(url, dest.as_path()).await?;
      println!("exported to {:?}", dest);
    }
    ["export", "vguides", id, rest @ ..] => match id.parse::<i64>() {
      Ok(id) => {
        let url = session.api.variant_guides_tsv_url(id)?;
        let dest = export_dest(config, rest, format!("variant_{}_guides.tsv", id).as_str())?;
        session.api.download_tsv(url, dest.as_path()).await?;
        println!("exported to {:?}", dest);
      }
      Err(_) => println!("not a variant id: {}", id),
    },

    ["report", email] => {
      submit_report(session, email).await?;
    }

    _ => println!("unrecognized command; 'help' lists commands"),
  }

  if rerender {
    print!("{}", render::render(&session.state));
  }
  Ok(false)
}

/// Edits one condition in place: `<id> [not] <field> <operator> [value]`.
/// The operator must belong to the chosen field's allowed vocabulary.
fn set_condition(state: &mut state::BrowserState, id: &str, rest: &[&str]) {
  let id = match id.parse::<i64>() {
    Ok(id) => id,
    Err(_) => {
      println!("not a condition id: {}", id);
      return;
    }
  };

  let (negated, rest) = match rest {
    ["not", rest @ ..] => (true, rest),
    _ => (false, rest),
  };

  let (field, op, value) = match rest {
    [field, op, value @ ..] => (*field, *op, value.join(" ")),
    _ => {
      println!("usage: cond set <id> [not] <field> <operator> [value]");
      return;
    }
  };

  if state.field_meta(field).is_none() {
    println!("unknown field: {}", field);
    return;
  }
  let operator = match parse_operator(op) {
    Some(o) => o,
    None => {
      println!("unknown operator: {}", op);
      return;
    }
  };
  if !allowed_operators(state.field_meta(field)).contains(&operator) {
    println!("operator {} not allowed for field {}", operator, field);
    return;
  }

  match state.filters.get_mut(id) {
    Some(c) => {
      c.negated = negated;
      c.field = field.to_string();
      c.operator = operator;
      c.value = if operator.takes_value() {
        value
      } else {
        "".to_string()
      };
    }
    None => println!("no condition with id {}", id),
  }
}

fn export_dest(config: &Config, rest: &[&str], default_name: &str) -> Result<PathBuf, mherr::Error> {
  match rest {
    [file, ..] => Ok(PathBuf::from(file)),
    [] => {
      std::fs::create_dir_all(&config.export_dir)?;
      Ok(config.export_dir.join(default_name))
    }
  }
}

/// Fetches a fresh report token, reads the report body from stdin up to a
/// lone ".", and submits it.
async fn submit_report(session: &mut Session, email: &str) -> Result<(), mherr::Error> {
  let token = session.api.token().await?;
  if let Ok(now) = util::now() {
    if token.expiry < now {
      println!("report token already expired; try again");
      return Ok(());
    }
  }

  println!("enter the report text, end with a line containing only '.':");
  let mut text = String::new();
  loop {
    let mut line = String::new();
    if stdin().read_line(&mut line)? == 0 || line.trim_end() == "." {
      break;
    }
    text.push_str(line.as_str());
  }

  let reply = session
    .api
    .report(&BugReport {
      token: token.token,
      email: email.to_string(),
      text,
    })
    .await?;

  if reply.success {
    println!("bug report submitted");
  } else {
    println!(
      "report failed: {}",
      reply.reason.unwrap_or("unknown reason".to_string())
    );
  }
  Ok(())
}
