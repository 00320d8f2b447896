use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Paragraph, Widget, Wrap};

use term_dock::config::{Dimensions, ItemConfig, LayoutConfig, PopoutConfig};
use term_dock::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use term_dock::drivers::{InputDriver, OutputDriver};
use term_dock::event_loop::{ControlFlow, EventLoop};
use term_dock::tracing_sub::{self, SubscriberMakeWriter};
use term_dock::{
    ComponentRegistry, ItemContainer, LayoutManager, Panel, PointerState, PopoutHost,
    PopoutWindowId, Rect,
};

#[derive(Parser, Debug)]
#[command(
    name = "term-dock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive docking layout demo"
)]
struct Cli {
    /// Layout to load instead of the built-in demo layout.
    #[arg(short = 'l', long = "layout", value_name = "FILE")]
    layout: Option<PathBuf>,

    /// Where `s` writes the current layout.
    #[arg(short = 's', long = "save", value_name = "FILE")]
    save: Option<PathBuf>,

    /// Append log output to this file. Logging is off without it.
    #[arg(long = "log", value_name = "FILE")]
    log: Option<PathBuf>,

    /// Frame interval in milliseconds.
    #[arg(long = "tick", value_name = "MS", default_value_t = 16)]
    tick_ms: u64,
}

/// Shows the panel title and an optional `text` entry from its state.
struct NotePanel;

impl Panel for NotePanel {
    fn render(&mut self, buffer: &mut Buffer, area: ratatui::layout::Rect, container: &ItemContainer) {
        let text = container
            .state()
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        Paragraph::new(format!("{}\n\n{}", container.title, text))
            .style(Style::default().add_modifier(Modifier::DIM))
            .wrap(Wrap { trim: true })
            .render(area, buffer);
    }
}

/// Terminal stand-in for a window system: every popout is accepted and
/// parked until popped back in with `p`.
#[derive(Default)]
struct ParkedPopouts {
    parked: Rc<RefCell<Vec<PopoutWindowId>>>,
}

impl PopoutHost for ParkedPopouts {
    fn open(&mut self, window: PopoutWindowId, config: &PopoutConfig) -> bool {
        tracing::info!(window = window.0, items = config.content.len(), "parked popout");
        self.parked.borrow_mut().push(window);
        true
    }

    fn close(&mut self, window: PopoutWindowId) {
        self.parked.borrow_mut().retain(|w| *w != window);
    }
}

fn demo_layout() -> LayoutConfig {
    let note = |title: &str, text: &str| {
        ItemConfig::component("note")
            .with_title(title)
            .with_state(serde_json::json!({ "text": text }))
    };
    LayoutConfig::new(vec![ItemConfig::row(vec![
        ItemConfig::column(vec![
            ItemConfig::stack(vec![
                note("editor", "Drag tabs by their title to move them."),
                note("scratch", "Middle-click a tab to close it."),
            ]),
            note("terminal", "Drop on a stack edge to split it.").with_height(30.0),
        ])
        .with_width(65.0),
        note("outline", "Drag the bars between panels to resize."),
    ])])
    .with_dimensions(Dimensions::terminal())
}

fn load_layout(cli: &Cli) -> io::Result<LayoutConfig> {
    match &cli.layout {
        Some(path) => LayoutConfig::from_path(path).map_err(io::Error::other),
        None => Ok(demo_layout()),
    }
}

fn save_layout(manager: &LayoutManager, path: &PathBuf) -> io::Result<()> {
    let json = manager
        .to_config()
        .map_err(io::Error::other)?
        .to_json_string()
        .map_err(io::Error::other)?;
    std::fs::write(path, json)
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log {
        tracing_sub::init_with(SubscriberMakeWriter::to_file(path)?);
    }

    let config = load_layout(&cli)?;
    let mut registry = ComponentRegistry::default();
    registry.register("note", |_| Box::new(NotePanel));
    registry.set_fallback(|_| Box::new(NotePanel));
    let mut manager = LayoutManager::new(config, registry).map_err(io::Error::other)?;

    let host = ParkedPopouts::default();
    let parked = Rc::clone(&host.parked);
    manager.set_popout_host(Box::new(host));

    let mut output = ConsoleOutputDriver::new()?;
    let size = output.size()?;
    manager
        .init(Rect::new(0.0, 0.0, size.width as f64, size.height as f64))
        .map_err(io::Error::other)?;

    output.enter()?;
    let mut input = ConsoleInputDriver::new();
    input.set_mouse_capture(true)?;

    let pointer = RefCell::new(PointerState::default());
    let mut event_loop = EventLoop::new(input, Duration::from_millis(cli.tick_ms));
    let result = event_loop.run(
        &mut manager,
        |manager| {
            let hover = pointer.borrow().hover();
            output.draw(|frame| manager.render(frame.buffer_mut(), hover))
        },
        |manager, event| {
            match event {
                Event::Key(key)
                    if key.code == KeyCode::Char('q')
                        || (key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL)) =>
                {
                    return Ok(ControlFlow::Quit);
                }
                Event::Key(key) if key.code == KeyCode::Char('p') => {
                    let last = parked.borrow().last().copied();
                    if let Some(window) = last
                        && let Err(err) = manager.pop_in(window)
                    {
                        tracing::warn!(error = %err, "pop in failed");
                    }
                }
                Event::Key(key) if key.code == KeyCode::Char('s') => {
                    if let Some(path) = &cli.save {
                        save_layout(manager, path)?;
                        tracing::info!(path = %path.display(), "layout saved");
                    }
                }
                Event::Resize(width, height) => {
                    manager
                        .update_size(Rect::new(0.0, 0.0, width as f64, height as f64))
                        .map_err(io::Error::other)?;
                }
                other => {
                    if let Err(err) = manager.handle_event(&mut pointer.borrow_mut(), &other) {
                        tracing::warn!(error = %err, "pointer event rejected");
                    }
                }
            }
            Ok(ControlFlow::Continue)
        },
    );

    manager.destroy();
    output.exit()?;
    result
}
