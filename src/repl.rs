use std::{borrow::Cow, fmt::Write as _, path::PathBuf, sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use material_sensei::{
    penguin::{Ingestor, RefreshStatus},
    resolver::MaterialNode,
    MaterialReport, QueryOutcome, Sensei,
};
use reedline::{FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, Reedline, Signal};
use termimad::{crossterm::style::Color, MadSkin};

const GREEN_BOLD: &str = "\x1b[1;32m";
const RED_BOLD: &str = "\x1b[1;31m";
const CYAN_BOLD: &str = "\x1b[1;36m";
const DIM: &str = "\x1b[2m";
const GRAY: &str = "\x1b[38;5;245m";
const RESET: &str = "\x1b[0m";

// ── Custom prompt ──────────────────────────────────────────────

struct DoctorPrompt {
    /// Waiting for the user to name a material.
    asking: bool,
}

impl Prompt for DoctorPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.asking {
            Cow::Borrowed("\x1b[1;33mWhich material?\x1b[0m")
        } else {
            Cow::Borrowed("\x1b[1;36mDoctor\x1b[0m")
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(".. ")
    }

    fn render_prompt_history_search_indicator(&self, _search: PromptHistorySearch) -> Cow<'_, str> {
        Cow::Borrowed("(search)> ")
    }
}

// ── History ────────────────────────────────────────────────────

fn history_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("material-sensei")
        .join("history.txt")
}

fn build_editor() -> Reedline {
    match FileBackedHistory::with_file(1000, history_path()) {
        Ok(history) => Reedline::create().with_history(Box::new(history)),
        Err(e) => {
            eprintln!(
                "{DIM}Warning: could not open history file ({e}), using in-memory history{RESET}"
            );
            Reedline::create()
        }
    }
}

// ── Slash commands ─────────────────────────────────────────────

fn print_help() {
    println!(
        "\n{CYAN_BOLD}Material Sensei{RESET}: farming recommendations\n\n\
         {DIM}Commands:{RESET}\n  \
         /help     Show this help message\n  \
         /refresh  Re-fetch Penguin drop data now\n  \
         /quit     Exit (or Ctrl+D)\n\n\
         Ask about a material, e.g. \"固源岩怎么刷\" or \"查材料 装置\".\n"
    );
}

// ── Markdown skin ─────────────────────────────────────────────

fn build_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::White);
    skin.italic.set_fg(Color::AnsiValue(183));
    skin.headers[0].set_fg(Color::Cyan);
    skin.headers[1].set_fg(Color::Cyan);
    skin.headers[2].set_fg(Color::Cyan);
    skin.bullet = termimad::StyledChar::from_fg_char(Color::Green, '•');
    skin
}

// ── Report rendering ──────────────────────────────────────────

/// Render a report as terminal markdown.
pub fn report_markdown(report: &MaterialReport) -> String {
    let mut out = String::new();
    let stars = "★".repeat(usize::from(report.info.material_rarity));
    let _ = writeln!(out, "## {} {stars}\n", report.name);
    if !report.info.material_desc.is_empty() {
        let _ = writeln!(out, "*{}*\n", report.info.material_desc);
    }
    if !report.info.obtain_approach.is_empty() {
        let _ = writeln!(out, "Obtained from: {}\n", report.info.obtain_approach);
    }

    if !report.children.is_empty() {
        out.push_str("**Crafted from**\n\n");
        write_tree(&mut out, &report.children, 0);
        out.push('\n');
    }

    for (title, sources) in [
        ("Main story stages", &report.source.main),
        ("Event stages", &report.source.act),
    ] {
        if sources.is_empty() {
            continue;
        }
        let _ = writeln!(out, "**{title}**\n\n|Stage|Name|Rate|\n|-|-|-|");
        for s in sources {
            let _ = writeln!(out, "|{}|{}|{}|", s.code, s.name, s.rate);
        }
        out.push('\n');
    }

    if report.recommend.is_empty() {
        out.push_str("No Penguin drop data for this material.\n");
    } else {
        out.push_str("**Recommended stages**\n\n|Stage|Name|AP|Drop rate|AP per unit|\n|-|-|-|-|-|\n");
        for r in &report.recommend {
            let desired = r
                .desired
                .map_or_else(|| "-".to_string(), |d| format!("{d:.1}"));
            let _ = writeln!(
                out,
                "|{}|{}|{}|{:.1}%|{desired}|",
                r.code,
                r.name,
                r.ap_cost,
                r.rate * 100.0
            );
        }
    }

    out
}

fn write_tree(out: &mut String, nodes: &[MaterialNode], depth: usize) {
    for node in nodes {
        let _ = writeln!(
            out,
            "{}* {} ×{}",
            "  ".repeat(depth),
            node.material.material_name,
            node.edge.use_number
        );
        write_tree(out, &node.children, depth + 1);
    }
}

// ── Interaction ───────────────────────────────────────────────

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                &format!("{GRAY}⠋{RESET}"),
                &format!("{GRAY}⠙{RESET}"),
                &format!("{GRAY}⠹{RESET}"),
                &format!("{GRAY}⠸{RESET}"),
                &format!("{GRAY}⠼{RESET}"),
                &format!("{GRAY}⠴{RESET}"),
                &format!("{GRAY}⠦{RESET}"),
                &format!("{GRAY}⠧{RESET}"),
                &format!("{GRAY}⠇{RESET}"),
                &format!("{GRAY}⠏{RESET}"),
            ])
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("{GRAY}{message}{RESET}"));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run one refresh with a spinner and print the outcome.
pub fn refresh_with_spinner(rt: &tokio::runtime::Runtime, ingestor: &Ingestor) -> RefreshStatus {
    let spinner = spinner("Fetching Penguin drop data...");
    let status = rt.block_on(ingestor.refresh());
    spinner.finish_and_clear();
    match status {
        RefreshStatus::Replaced { rows } => {
            println!("{DIM}Drop data refreshed: {rows} rows.{RESET}");
        }
        RefreshStatus::Failed => {
            eprintln!("{RED_BOLD}[Error]{RESET} drop data refresh failed, keeping previous data");
        }
    }
    status
}

/// Print a query outcome. Returns `true` when the user should be asked for a
/// material name next.
pub fn print_outcome(outcome: &QueryOutcome) -> bool {
    match outcome {
        QueryOutcome::Found(report) => {
            println!("\n{GREEN_BOLD}Sensei>{RESET}");
            build_skin().print_text(&report_markdown(report));
            println!();
            false
        }
        QueryOutcome::NeedsName => {
            println!("{DIM}Doctor, please name the material you are looking for.{RESET}");
            true
        }
        QueryOutcome::NotFound(name) => {
            println!("{DIM}Doctor, no material data found for {name} >.<{RESET}");
            false
        }
        QueryOutcome::Ignored => {
            println!("{DIM}That doesn't look like a material. Try /help.{RESET}");
            false
        }
    }
}

// ── Public entry point ─────────────────────────────────────────

pub fn run(
    rt: &tokio::runtime::Runtime,
    sensei: &Sensei,
    ingestor: &Arc<Ingestor>,
) -> anyhow::Result<()> {
    let mut editor = build_editor();
    let mut prompt = DoctorPrompt { asking: false };

    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(input)) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }

                match input {
                    "/quit" => break,
                    "/help" => print_help(),
                    "/refresh" => {
                        refresh_with_spinner(rt, ingestor);
                    }
                    _ if prompt.asking => {
                        let outcome = rt.block_on(sensei.clarify(input));
                        prompt.asking = print_outcome(&outcome);
                    }
                    _ => {
                        let outcome = rt.block_on(sensei.resolve_and_recommend(input));
                        prompt.asking = print_outcome(&outcome);
                    }
                }
            }
            Ok(Signal::CtrlD | Signal::CtrlC) => break,
            Err(e) => {
                eprintln!("{RED_BOLD}[Error]{RESET} {e}");
                break;
            }
        }
    }

    Ok(())
}
