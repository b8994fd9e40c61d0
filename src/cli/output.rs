//! Terminal output: notices, command results and the shared tables.

use console::style;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};

use compscope_core::format::{format_currency, format_number};
use compscope_core::{AnalysisProgress, StepStatus};

use crate::models::property::Property;
use crate::models::response::CommandResponse;
use crate::services::notice::{Notice, NoticeLevel};

/// A failure already shown to the user; the binary only sets the exit code.
#[derive(Debug, thiserror::Error)]
#[error("command failed")]
pub struct Reported;

pub fn success() -> console::StyledObject<&'static str> {
    style("✓").green()
}

pub fn error() -> console::StyledObject<&'static str> {
    style("✗").red()
}

fn notice_icon(level: NoticeLevel) -> console::StyledObject<&'static str> {
    match level {
        NoticeLevel::Success => success(),
        NoticeLevel::Info => style("→").cyan(),
        NoticeLevel::Warning => style("!").yellow(),
        NoticeLevel::Error => error(),
    }
}

/// Prints notices and command results for one CLI invocation
pub struct Output {
    notices: broadcast::Receiver<Notice>,
    json: bool,
    error_shown: bool,
}

impl Output {
    pub fn new(notices: broadcast::Receiver<Notice>, json: bool) -> Self {
        Self {
            notices,
            json,
            error_shown: false,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print every notice sent since the last call
    pub fn flush_notices(&mut self) {
        loop {
            match self.notices.try_recv() {
                Ok(notice) => {
                    if notice.level == NoticeLevel::Error {
                        self.error_shown = true;
                    }
                    if !self.json {
                        eprintln!("{} {}", notice_icon(notice.level), notice.message);
                    }
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// Show a command's notices and unwrap its data.
    ///
    /// With `--json` the whole response is printed instead and `Ok(None)` is
    /// returned, so callers skip their own rendering.
    pub fn finish<T: Serialize>(&mut self, response: CommandResponse<T>) -> anyhow::Result<Option<T>> {
        self.flush_notices();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return if response.success {
                Ok(None)
            } else {
                Err(Reported.into())
            };
        }
        match (response.success, response.data) {
            (true, Some(data)) => Ok(Some(data)),
            (true, None) => Ok(None),
            (false, _) => {
                if !self.error_shown {
                    let message = response.error.unwrap_or_else(|| "Unknown error".to_string());
                    eprintln!("{} {}", error(), message);
                }
                Err(Reported.into())
            }
        }
    }
}

/// Two lines for one property: position, address and id, then price and size
pub fn print_property(position: usize, property: &Property, price_of: fn(&Property) -> Option<f64>) {
    let address = property
        .display_address()
        .unwrap_or_else(|| "(no address)".to_string());
    println!(
        "{:>3}. {}  {}",
        position,
        style(address).bold(),
        style(property.any_id().unwrap_or_default()).dim()
    );
    let mut line = format!(
        "     {}  {} bd  {} ba  {} sqft",
        format_currency(price_of(property)),
        format_number(property.beds()),
        format_number(property.baths()),
        format_number(property.subject_sqft())
    );
    if let Some(miles) = property.distance_miles() {
        line.push_str(&format!("  {:.2} mi", miles));
    }
    println!("{}", line);
}

pub fn print_properties(properties: &[Property], price_of: fn(&Property) -> Option<f64>) {
    for (i, property) in properties.iter().enumerate() {
        print_property(i + 1, property, price_of);
    }
}

/// Step list with status markers, as shown during a run
pub fn render_progress(progress: &AnalysisProgress) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(address) = &progress.subject_address {
        lines.push(format!("{} {}", style("Analyzing").bold(), address));
    }
    for view in progress.visible_steps() {
        let marker = match view.status {
            StepStatus::Done => style("✓").green(),
            StepStatus::Active => style("●").cyan(),
            StepStatus::Pending => style("○").dim(),
        };
        lines.push(format!("  {} {:>2}. {}", marker, view.number, view.label));
    }
    if let Some(activity) = progress.current_activity() {
        lines.push(format!("  {}", style(activity).dim()));
    }
    lines
}
