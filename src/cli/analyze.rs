//! Live analysis run and stored results.

use console::{style, Term};

use compscope_core::AnalysisProgress;

use super::output::{render_progress, Output, Reported};
use super::workflow::print_result;
use crate::commands;
use crate::models::analysis::AnalysisOutcome;
use crate::state::AppState;

/// Redraws the step list in place on stderr
struct LiveSteps {
    term: Term,
    drawn: usize,
}

impl LiveSteps {
    fn new() -> Self {
        Self {
            term: Term::stderr(),
            drawn: 0,
        }
    }

    fn draw(&mut self, progress: &AnalysisProgress) {
        let lines = render_progress(progress);
        if self.drawn > 0 && self.term.clear_last_lines(self.drawn).is_err() {
            self.drawn = 0;
        }
        for line in &lines {
            let _ = self.term.write_line(line);
        }
        self.drawn = lines.len();
    }
}

/// Run the analysis, redrawing progress on every step. Ctrl-C cancels the
/// run and keeps the partial progress on screen.
pub async fn cmd_analyze(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    let live = !out.is_json() && Term::stderr().is_term();
    let mut steps = LiveSteps::new();

    let response = {
        let run = commands::run_analysis(state, |progress| {
            if live {
                steps.draw(progress);
            }
        });
        tokio::pin!(run);
        loop {
            tokio::select! {
                response = &mut run => break response,
                _ = tokio::signal::ctrl_c() => {
                    if state.analysis().cancel() {
                        eprintln!("{}", style("Cancelling...").yellow());
                    }
                }
            }
        }
    };

    if !live && !out.is_json() {
        for line in render_progress(&state.analysis().progress()) {
            eprintln!("{}", line);
        }
    }

    match out.finish(response)? {
        Some(AnalysisOutcome::Completed { result }) => {
            println!();
            print_result(&result);
            Ok(())
        }
        Some(AnalysisOutcome::NoResult) => Err(Reported.into()),
        Some(AnalysisOutcome::Cancelled) => {
            eprintln!("{}", style("Analysis cancelled").yellow());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Show the stored analysis, or fetch it from the server with `refresh`
pub async fn cmd_results(state: &AppState, out: &mut Output, refresh: bool) -> anyhow::Result<()> {
    if refresh {
        if let Some(result) = out.finish(commands::get_analysis(state).await)? {
            print_result(&result);
        }
        return Ok(());
    }

    if let Some(record) = out.finish(commands::get_stored_analysis(state))? {
        match (record.data, record.error) {
            (Some(result), _) => print_result(&result),
            (None, Some(error)) => println!("{} {}", style("Last analysis failed:").red(), error),
            (None, None) => println!("No analysis yet. Run `compscope analyze`."),
        }
    }
    Ok(())
}

pub async fn cmd_images(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    if let Some(analyses) = out.finish(commands::get_image_analyses(state).await)? {
        println!("{}", serde_json::to_string_pretty(&analyses)?);
    }
    Ok(())
}

pub fn cmd_reset(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    if out.finish(commands::reset_workflow(state))?.is_some() {
        println!("{} Workflow cleared", super::output::success());
    }
    Ok(())
}
