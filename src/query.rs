use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::fmt::Write;
use std::time::Duration;

use anyhow::{Error, Result};
use log::{debug, error, info};

use crate::directory;
use crate::directory::{Directory, Environment, Session};
use crate::request::{ConnectionRequest, SearchControls};

/// Text produced by one query plus the failure that cut it short, if any.
///
/// `Display` renders the operator-facing report: whatever was written before
/// the failure, followed by the exception block.
#[derive(Debug, Default)]
pub struct Outcome {
    pub text: String,
    pub entries: usize,
    pub error: Option<Error>,
    // taken where the failure was caught when the error carries none
    trace: Option<Backtrace>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn fail(&mut self, err: Error) {
        if err.backtrace().status() != BacktraceStatus::Captured {
            self.trace = Some(Backtrace::force_capture());
        }
        self.error = Some(err);
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if let Some(err) = &self.error {
            let trace = self.trace.as_ref().unwrap_or_else(|| err.backtrace());
            write!(f, "\n\nException:\n{}\n\nStack backtrace:\n{}\n", describe(err), trace)?;
        }
        Ok(())
    }
}

/// Message and cause chain, one cause per line. A cause already spelled out
/// by the message wrapping it is left out.
fn describe(err: &Error) -> String {
    let mut description = String::new();
    for cause in err.chain() {
        let message = cause.to_string();
        if description.contains(&message) {
            continue;
        }
        if !description.is_empty() {
            description.push_str("\nCaused by: ");
        }
        description.push_str(&message);
    }
    description
}

/// Opens one session, runs one subtree search and closes the session again.
/// Never fails: errors end up in the returned [`Outcome`].
pub fn query(request: &ConnectionRequest, conn_timeout: Option<Duration>) -> Outcome {
    let mut outcome = Outcome::default();

    match directory::new(&request.initial_context_factory, conn_timeout) {
        Ok(directory) => execute(directory.as_ref(), request, &mut outcome),
        Err(err) => outcome.fail(err),
    }

    match &outcome.error {
        None => info!(
            "query against '{}' as '{}': {} entries",
            request.provider_url, request.security_principal, outcome.entries,
        ),
        Some(err) => error!(
            "query against '{}' as '{}': {} entries, then {}",
            request.provider_url, request.security_principal, outcome.entries, err,
        ),
    }

    outcome
}

pub fn execute(directory: &dyn Directory, request: &ConnectionRequest, outcome: &mut Outcome) {
    let controls = SearchControls::new(request);

    let mut session = match directory.open(&Environment::new(request)) {
        Ok(session) => session,
        Err(err) => {
            outcome.fail(err);
            return;
        }
    };
    debug!("opened session {}", session.class_name());

    let searched = search(session.as_mut(), request, &controls, outcome);
    let closed = session.close();
    debug!("closed session {}", session.class_name());

    if let Err(err) = searched.and(closed) {
        outcome.fail(err);
    }
}

fn search(session: &mut dyn Session, request: &ConnectionRequest, controls: &SearchControls, outcome: &mut Outcome) -> Result<()> {
    let text = &mut outcome.text;
    writeln!(text, "DirContext class: {}", session.class_name())?;

    let entries = session.search(&request.base_dn, &request.search_filter, controls)?;

    for (item, entry) in entries.enumerate() {
        // a failure while fetching must not leave a header behind
        let entry = entry?;
        debug!("search result {}: '{}'", item, entry.dn);

        write!(text, "\nSearch Result {}\n", item)?;
        for attr in &entry.attributes {
            writeln!(text, "    {} = {}", attr.id, attr.first_value())?;
        }
        text.push('\n');
        outcome.entries += 1;
    }

    Ok(())
}
