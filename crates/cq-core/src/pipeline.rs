//! The three-stage pipeline: preprocess, parse, evaluate.
//!
//! ```text
//! reprocess ──▶ reparse ──▶ reevaluate
//!  (rewrite      (rebuild     (toggle
//!   sheets)       registry)    classes)
//! ```
//!
//! Each stage runs the following ones. A stage invoked before its
//! prerequisite has ever run runs the prerequisite first, so calling
//! [`Pipeline::reevaluate`] on a fresh pipeline does all three.

use std::borrow::Cow;
use std::cmp::Reverse;
use std::sync::mpsc;
use std::thread;

use cq_common::warning::warn_once;

use crate::evaluate::{EvaluationReport, evaluate};
use crate::host::{Fetcher, SheetHost, SheetOwner, StyleHost};
use crate::registry::Registry;
use crate::rewrite::{resolve_relative_urls, rewrite_stylesheet};

/// Optional completion callback, invoked once after a stage and everything
/// it chained into have finished.
pub type Callback<'a> = Option<Box<dyn FnOnce() + 'a>>;

/// Owns a host, a fetcher and the registry built from the host's sheets.
pub struct Pipeline<H, F> {
    host: H,
    fetcher: F,
    registry: Registry,
    processed: bool,
    parsed: bool,
}

impl<H: StyleHost + SheetHost, F: Fetcher> Pipeline<H, F> {
    /// Wrap a host. Nothing runs until a stage is invoked.
    #[must_use]
    pub const fn new(host: H, fetcher: F) -> Self {
        Self {
            host,
            fetcher,
            registry: Registry::new(),
            processed: false,
            parsed: false,
        }
    }

    /// Fetch and rewrite every stylesheet, then reparse and reevaluate.
    pub fn reprocess(&mut self, callback: Callback<'_>) -> EvaluationReport {
        let _ = preprocess(&mut self.host, &self.fetcher);
        self.processed = true;
        self.parsed = false;
        let report = self.reparse(None);
        finish(callback);
        report
    }

    /// Rebuild the registry from the host's rule tree, then reevaluate.
    pub fn reparse(&mut self, callback: Callback<'_>) -> EvaluationReport {
        if !self.processed {
            return self.reprocess(callback);
        }
        self.registry = Registry::build(&self.host);
        self.parsed = true;
        let report = self.reevaluate(None);
        finish(callback);
        report
    }

    /// Toggle every query's class against the current layout.
    pub fn reevaluate(&mut self, callback: Callback<'_>) -> EvaluationReport {
        if !self.parsed {
            return self.reparse(callback);
        }
        let report = evaluate(&mut self.host, &self.registry);
        finish(callback);
        report
    }

    /// The registry of the last parse.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably (e.g. to resize the viewport before reevaluating).
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Give the host back.
    #[must_use]
    pub fn into_host(self) -> H {
        self.host
    }
}

fn finish(callback: Callback<'_>) {
    if let Some(callback) = callback {
        callback();
    }
}

/// Rewrite every enabled stylesheet of `host` and swap in the ones that
/// changed. Returns the number of replaced sheets.
///
/// Linked sheets are fetched in parallel. A failed fetch leaves that sheet
/// untouched and is reported once; it never aborts the batch. Relative
/// `url()` references in fetched text are resolved against the sheet's URL,
/// since the replacement no longer lives there. Fetched text that needs no
/// rewriting goes to [`SheetHost::sheet_loaded`].
pub fn preprocess<H, F>(host: &mut H, fetcher: &F) -> usize
where
    H: SheetHost + ?Sized,
    F: Fetcher + ?Sized,
{
    let sources = host.sheet_sources();
    let mut texts: Vec<Option<SheetText>> = vec![None; sources.len()];

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        let mut pending = 0usize;
        for (slot, source) in sources.iter().enumerate() {
            if source.disabled {
                continue;
            }
            match &source.owner {
                SheetOwner::Inline { text } => {
                    texts[slot] = Some(SheetText::Inline(text.clone()));
                }
                SheetOwner::Linked { href } => {
                    pending += 1;
                    let tx = tx.clone();
                    let _ = scope.spawn(move || {
                        let text = match fetcher.fetch(href) {
                            Ok(text) => {
                                SheetText::Fetched(resolve_relative_urls(&text, href).into_owned())
                            }
                            Err(err) => {
                                warn_once("fetch", &format!("failed to load '{href}': {err}"));
                                SheetText::Failed
                            }
                        };
                        let _ = tx.send((slot, text));
                    });
                }
            }
        }
        drop(tx);

        while pending > 0 {
            let Ok((slot, text)) = rx.recv() else {
                break;
            };
            texts[slot] = Some(text);
            pending -= 1;
        }
    });

    let mut replacements: Vec<(usize, String)> = Vec::new();
    for (source, text) in sources.iter().zip(texts) {
        let (text, fetched) = match text {
            Some(SheetText::Inline(text)) => (text, false),
            Some(SheetText::Fetched(text)) => (text, true),
            Some(SheetText::Failed) | None => continue,
        };
        let rewritten = match rewrite_stylesheet(&text) {
            Cow::Owned(rewritten) => Some(rewritten),
            Cow::Borrowed(_) => None,
        };
        match rewritten {
            Some(rewritten) => replacements.push((source.index, rewritten)),
            None if fetched => host.sheet_loaded(source.index, text),
            None => {}
        }
    }

    // Replacing a sheet shifts every later index, so go back to front.
    replacements.sort_by_key(|(index, _)| Reverse(*index));
    let replaced = replacements.len();
    for (index, text) in replacements {
        host.replace_sheet(index, text);
    }
    replaced
}

/// The text gathered for one sheet.
#[derive(Debug, Clone)]
enum SheetText {
    Inline(String),
    Fetched(String),
    Failed,
}
