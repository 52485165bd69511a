use arbor_core::{TreeDatum, TreeProperties};
use arbor_render::{DiagramOptions, SvgRenderOptions, TreeDiagram, ZoomGesture};
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Core(arbor_core::Error),
    Render(arbor_render::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<arbor_core::Error> for CliError {
    fn from(value: arbor_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<arbor_render::Error> for CliError {
    fn from(value: arbor_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Layout,
    Scene,
    #[default]
    Render,
}

/// Interactions replayed in command-line order.
#[derive(Debug, Clone)]
enum Action {
    Click(String),
    ClickAt(f64, f64),
    Gesture(ZoomGesture),
    ExpandAll,
    CollapseAll,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    props: Option<String>,
    actions: Vec<Action>,
    tick_ms: Option<f64>,
    pretty: bool,
    live_only: bool,
    diagram_id: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "arbor-cli\n\
\n\
USAGE:\n\
  arbor-cli layout [--props <path>] [ACTIONS] [--tick <ms>] [--pretty] [--out <path>] [<path>|-]\n\
  arbor-cli scene [--props <path>] [ACTIONS] [--tick <ms>] [--pretty] [--out <path>] [<path>|-]\n\
  arbor-cli [render] [--props <path>] [ACTIONS] [--tick <ms>] [--id <diagram-id>] [--live-only] [--out <path>] [<path>|-]\n\
\n\
ACTIONS (replayed in order):\n\
  --click <name>         toggle the first node with that name\n\
  --click-at <x>,<y>     click whatever node is drawn at a canvas point\n\
  --gesture <json>       feed a zoom gesture, e.g. '{\"type\":\"drag\",\"dx\":10,\"dy\":0}'\n\
  --expand-all           expand every collapsed node\n\
  --collapse-all         collapse every expanded node\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', tree JSON is read from stdin.\n\
  - Animations settle before every action. After the last one the clock is run to completion,\n\
    or to <ms> when --tick is given.\n\
  - layout prints the positioned nodes and edges as JSON; scene prints the bound elements.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - Set ARBOR_LOG (e.g. ARBOR_LOG=debug) to log pipeline passes to stderr.\n\
"
}

fn parse_point(raw: &str) -> Option<(f64, f64)> {
    let (x, y) = raw.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "scene" => args.command = Command::Scene,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--live-only" => args.live_only = true,
            "--expand-all" => args.actions.push(Action::ExpandAll),
            "--collapse-all" => args.actions.push(Action::CollapseAll),
            "--props" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.props = Some(path.clone());
            }
            "--click" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.actions.push(Action::Click(name.clone()));
            }
            "--click-at" => {
                let Some(raw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let (x, y) = parse_point(raw).ok_or(CliError::Usage(usage()))?;
                args.actions.push(Action::ClickAt(x, y));
            }
            "--gesture" => {
                let Some(raw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.actions
                    .push(Action::Gesture(serde_json::from_str::<ZoomGesture>(raw)?));
            }
            "--tick" => {
                let Some(ms) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let ms = ms.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !ms.is_finite() {
                    return Err(CliError::Usage(usage()));
                }
                args.tick_ms = Some(ms);
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.diagram_id = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    write_text(&text, out)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ARBOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn replay(diagram: &mut TreeDiagram, actions: &[Action]) -> Result<(), CliError> {
    for action in actions {
        diagram.settle();
        match action {
            Action::Click(name) => {
                let outcome = diagram.click_by_name(name)?;
                tracing::info!(name = name.as_str(), ?outcome, "click");
            }
            Action::ClickAt(x, y) => {
                let outcome = diagram.click_at(*x, *y)?;
                tracing::info!(x, y, ?outcome, "click at");
            }
            Action::Gesture(gesture) => {
                if !diagram.gesture(gesture) {
                    tracing::warn!(?gesture, "gesture ignored");
                }
            }
            Action::ExpandAll => {
                let outcome = diagram.expand_all();
                tracing::info!(?outcome, "expand all");
            }
            Action::CollapseAll => {
                let outcome = diagram.collapse_all();
                tracing::info!(?outcome, "collapse all");
            }
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let data = TreeDatum::from_json_str(&text)?;
    let props = match args.props.as_deref() {
        Some(path) => TreeProperties::from_json_str(&std::fs::read_to_string(path)?)?,
        None => TreeProperties::default(),
    };

    let mut diagram = TreeDiagram::create(Arc::new(data), props, DiagramOptions::default())?;
    replay(&mut diagram, &args.actions)?;
    let state = match args.tick_ms {
        Some(ms) => diagram.tick(ms),
        None => diagram.settle(),
    };
    tracing::debug!(?state, now_ms = diagram.now_ms(), "clock stopped");

    match args.command {
        Command::Layout => write_json(diagram.layout(), args.pretty, args.out.as_deref()),
        Command::Scene => write_json(diagram.scene(), args.pretty, args.out.as_deref()),
        Command::Render => {
            let mut options = SvgRenderOptions {
                include_exiting: !args.live_only,
                ..SvgRenderOptions::default()
            };
            if let Some(id) = args.diagram_id {
                options.diagram_id = id;
            }
            write_text(&diagram.to_svg_with(&options), args.out.as_deref())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    init_tracing();
    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
