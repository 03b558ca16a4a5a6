use crate::api::ApiClient;
use crate::config::Config;
use crate::error as mherr;
use crate::state::BrowserState;
use log::{error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One browsing session: the API client, the state it feeds, and the
/// request generation counter.  Each reload belongs to a generation; a
/// response whose generation is no longer current is dropped instead of
/// racing a newer render.
pub struct Session {
  pub api: ApiClient,
  pub state: BrowserState,
  generation: Arc<AtomicU64>,
}

impl Session {
  /// Fetches field metadata and dataset bounds, builds the initial state,
  /// and loads the first page with counts.
  pub async fn connect(config: &Config) -> Result<Session, mherr::Error> {
    let api = ApiClient::new(config.api_url.as_str(), config.dataset.as_str())?;
    let (metadata, fields) = tokio::try_join!(api.metadata(), api.variant_fields())?;
    info!(
      "connected to {} dataset {}, api version {}",
      config.api_url, config.dataset, metadata.version
    );
    let mut session = Session {
      api,
      state: BrowserState::new(metadata, fields, config.items_per_page),
      generation: Arc::new(AtomicU64::new(0)),
    };
    session.reload(true).await;
    Ok(session)
  }

  pub fn generation(&self) -> u64 {
    self.generation.load(Ordering::SeqCst)
  }

  /// Reloads the current page of both entry types concurrently and applies
  /// them atomically once both have arrived.  When a recount is requested
  /// the counts are cleared (entering the approximate-totals window) and
  /// fetched as their own concurrent pair.  Fetch errors are logged and
  /// leave the previous state displayed; there is no retry.
  pub async fn reload(&mut self, reload_counts: bool) {
    let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let search = self.state.search_params();
    let page = self.state.page_params();

    if reload_counts {
      self.state.variant_count = None;
      self.state.guide_count = None;
    }

    let entries = async {
      tokio::try_join!(
        self.api.variants_page(&search, &page),
        self.api.guides_page(&search, &page)
      )
    };
    let counts = async {
      if reload_counts {
        Some(tokio::try_join!(
          self.api.variants_entries(&search),
          self.api.guides_entries(&search)
        ))
      } else {
        None
      }
    };
    let (entries_res, counts_res) = tokio::join!(entries, counts);

    if self.generation.load(Ordering::SeqCst) != my_gen {
      info!("dropping stale reload, generation {}", my_gen);
      return;
    }

    match entries_res {
      Ok((variants, guides)) => {
        self.state.variants = variants;
        self.state.guides = guides;
      }
      Err(e) => {
        error!("entry fetch failed, keeping previous page: {:?}", e);
      }
    }

    match counts_res {
      Some(Ok((vc, gc))) => {
        self.state.variant_count = Some(vc);
        self.state.guide_count = Some(gc);
      }
      Some(Err(e)) => {
        error!("count fetch failed, totals stay approximate: {:?}", e);
      }
      None => (),
    }
  }
}
