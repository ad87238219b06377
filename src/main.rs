use std::io;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::event::{
    DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{Frame, Terminal};

use sprouts::app::{
    self, AnswerOutcome, App, ParentEdit, SEEDS_PER_LEVEL, parent_settings_store, progress_store,
};
use sprouts::config::Config;
use sprouts::content::ContentPack;
use sprouts::event::{AppEvent, EventHandler};
use sprouts::logging;
use sprouts::session::{SessionSink, SessionTimer};
use sprouts::store::{FileBackend, KeyValueBackend, MemoryBackend};
use sprouts::ui::components::progress_bar::ProgressBar;
use sprouts::ui::components::quiz_card::{Feedback, QuizCard};
use sprouts::ui::components::session_summary::SessionSummary;
use sprouts::ui::layout::{AppLayout, centered_rect};
use sprouts::ui::theme::Theme;

type SharedBackend = Rc<dyn KeyValueBackend>;

#[derive(Parser)]
#[command(name = "sprouts", version, about = "Children's quiz games in the terminal")]
struct Cli {
    #[arg(short, long, help = "Content pack (science, reading, math)")]
    pack: Option<String>,

    #[arg(short, long, help = "Play theme (garden, ocean, space)")]
    theme: Option<String>,

    #[arg(short, long, help = "Difficulty (beginner, intermediate, advanced)")]
    difficulty: Option<String>,

    #[arg(short, long, help = "Game mode within the pack")]
    mode: Option<String>,

    #[arg(long, help = "Keep progress in memory; nothing is saved")]
    memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the saved progress record for the pack
    Stats,
    /// Change parental controls (requires the parent PIN)
    Parent(ParentArgs),
}

#[derive(Args)]
struct ParentArgs {
    #[arg(long, help = "Parent PIN; the first PIN entered becomes the PIN")]
    pin: String,

    #[arg(long, value_name = "MINUTES", help = "Session limit, 0 for unlimited")]
    time_limit: Option<u32>,

    #[arg(long, value_name = "BOOL")]
    stop_after_question: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    lock_theme: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    lock_difficulty: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    lock_mode: Option<bool>,

    #[arg(long, value_delimiter = ',')]
    allow_themes: Option<Vec<String>>,

    #[arg(long, value_delimiter = ',')]
    allow_difficulties: Option<Vec<String>>,

    #[arg(long, value_delimiter = ',')]
    allow_modes: Option<Vec<String>>,

    #[arg(long, value_name = "PIN")]
    new_pin: Option<String>,

    #[arg(long, help = "Zero the progress record")]
    reset_progress: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(pack) = &self.pack {
            config.pack = pack.clone();
            config.pack_path = None;
        }
        if self.theme.is_some() {
            config.theme = self.theme.clone();
        }
        if self.difficulty.is_some() {
            config.difficulty = self.difficulty.clone();
        }
        if self.mode.is_some() {
            config.mode = self.mode.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.apply(&mut config);
    let _log_guard = logging::init_tracing(&config.log_level, &config.log_dir());

    let pack = load_pack(&config)?;
    let backend: SharedBackend = if cli.memory {
        Rc::new(MemoryBackend::new())
    } else {
        Rc::new(FileBackend::with_base_dir(config.data_dir.clone())?)
    };
    tracing::info!(pack = %pack.id, memory = cli.memory, "starting sprouts");

    match cli.command {
        Some(Command::Stats) => print_stats(&pack, backend, &config),
        Some(Command::Parent(args)) => run_parent(&pack, backend, &config, args),
        None => play(pack, backend, &config),
    }
}

fn load_pack(config: &Config) -> Result<ContentPack> {
    let pack = match &config.pack_path {
        Some(path) => ContentPack::from_path(path)?,
        None => ContentPack::builtin(&config.pack).with_context(|| {
            format!("available packs: {}", ContentPack::builtin_ids().join(", "))
        })?,
    };
    Ok(pack)
}

fn print_stats(pack: &ContentPack, backend: SharedBackend, config: &Config) -> Result<()> {
    let record = progress_store(pack, backend, config).load_progress();

    println!("Sprouts progress ({})", pack.title);
    println!("  Questions answered: {}", record.total_questions_answered);
    println!(
        "  Correct answers:    {} ({:.0}%)",
        record.total_correct_answers,
        record.accuracy()
    );
    println!("  Best streak:        {}", record.streak_best);
    println!("  Current streak:     {}", record.current_streak);
    println!("  Sessions:           {}", record.sessions_count);
    println!(
        "  Play time:          {}m {}s",
        record.total_play_time_seconds / 60,
        record.total_play_time_seconds % 60
    );
    match record.last_played_at {
        Some(at) => println!("  Last played:        {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("  Last played:        never"),
    }

    println!("  By difficulty:");
    for (difficulty, bucket) in &record.per_difficulty_stats {
        println!("    {difficulty:<14}{}/{}", bucket.correct, bucket.answered);
    }
    println!("  By mode:");
    for (mode, bucket) in &record.per_mode_stats {
        let label = pack.mode_label(mode).unwrap_or(mode.as_str());
        println!("    {label:<14}{}/{}", bucket.correct, bucket.answered);
    }
    Ok(())
}

impl From<ParentArgs> for ParentEdit {
    fn from(args: ParentArgs) -> Self {
        ParentEdit {
            time_limit: args.time_limit,
            stop_after_question: args.stop_after_question,
            lock_theme: args.lock_theme,
            lock_difficulty: args.lock_difficulty,
            lock_mode: args.lock_mode,
            allow_themes: args.allow_themes,
            allow_difficulties: args.allow_difficulties,
            allow_modes: args.allow_modes,
            new_pin: args.new_pin,
        }
    }
}

fn run_parent(
    pack: &ContentPack,
    backend: SharedBackend,
    config: &Config,
    args: ParentArgs,
) -> Result<()> {
    let store = parent_settings_store(pack, Rc::clone(&backend), config);
    let before = store.load_parent_settings();
    let pin = args.pin.clone();
    let reset_progress = args.reset_progress;
    let new_pin = args.new_pin.is_some();

    let settings = app::edit_parent_settings(&store, &pin, args.into(), pack)?;
    if before.pin.is_none() {
        println!("Parent PIN set.");
    }
    if new_pin {
        println!("Parent PIN changed.");
    }

    if reset_progress {
        progress_store(pack, backend, config).reset_progress();
        println!("Progress reset.");
    }

    let limit = match settings.session_time_limit {
        0 => "unlimited".to_string(),
        minutes => format!("{minutes} min"),
    };
    println!("Session limit:   {limit}");
    println!("Stop after question: {}", settings.stop_after_current_question);
    println!(
        "Locks:           theme={} difficulty={} mode={}",
        settings.locks.theme, settings.locks.difficulty, settings.locks.game_mode
    );
    println!("Themes:          {}", settings.allowed_themes.join(", "));
    println!("Difficulties:    {}", settings.allowed_difficulties.join(", "));
    println!("Modes:           {}", settings.allowed_modes.join(", "));
    Ok(())
}

struct PlayScreen {
    app: App<SharedBackend>,
    palette: Theme,
    palette_for: String,
    feedback: Option<Feedback>,
    notice: Option<String>,
    should_quit: bool,
}

impl PlayScreen {
    fn new(app: App<SharedBackend>) -> Self {
        let palette = Theme::load_or_default(&app.theme);
        let palette_for = app.theme.clone();
        Self {
            app,
            palette,
            palette_for,
            feedback: None,
            notice: None,
            should_quit: false,
        }
    }

    fn refresh_palette(&mut self) {
        if self.palette_for != self.app.theme {
            self.palette = Theme::load_or_default(&self.app.theme);
            self.palette_for = self.app.theme.clone();
        }
    }

    fn report(&mut self, result: Result<(), app::SelectionError>) {
        match result {
            Ok(()) => self.feedback = None,
            Err(e) => self.notice = Some(e.to_string()),
        }
    }
}

fn play(pack: ContentPack, backend: SharedBackend, config: &Config) -> Result<()> {
    let sink = progress_store(&pack, Rc::clone(&backend), config);
    let mut screen = PlayScreen::new(App::new(pack, backend, config));
    let mut timer = SessionTimer::new(sink, screen.app.settings.session_time_limit);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let events = EventHandler::new(Duration::from_secs(1));
    let result = run_app(&mut terminal, &mut screen, &mut timer, &events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    let duration_seconds = timer.finish();
    tracing::info!(duration_seconds, garden = screen.app.garden, "left the quiz");
    result
}

fn run_app<S: SessionSink>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &mut PlayScreen,
    timer: &mut SessionTimer<S>,
    events: &EventHandler,
) -> Result<()> {
    loop {
        let remaining = timer.remaining_seconds();
        terminal.draw(|frame| render(frame, screen, remaining))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(screen, key),
            AppEvent::Tick => {
                timer.tick_with(|| screen.app.handle_time_up());
            }
            AppEvent::Focus(visible) => timer.set_visible(visible),
            AppEvent::Resize => {}
        }

        if screen.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(screen: &mut PlayScreen, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        screen.should_quit = true;
        return;
    }

    if screen.app.session_over() {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter) {
            screen.should_quit = true;
        }
        return;
    }

    screen.notice = None;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => screen.should_quit = true,
        KeyCode::Char(c @ '1'..='3') => {
            let index = (c as u8 - b'1') as usize;
            match screen.app.answer(index) {
                AnswerOutcome::Correct { leveled_up } => {
                    screen.feedback = Some(Feedback::Correct);
                    if leveled_up {
                        screen.notice = Some("Your garden grew a new plant!".to_string());
                    }
                }
                AnswerOutcome::Incorrect => screen.feedback = Some(Feedback::TryAgain),
                AnswerOutcome::Ignored => {}
            }
        }
        KeyCode::Char('h') => {
            if screen.app.hint().is_none() {
                screen.notice = Some("No hint for this one.".to_string());
            }
        }
        KeyCode::Char('n') => {
            screen.app.next_problem();
            screen.feedback = None;
        }
        KeyCode::Char('r') => {
            screen.app.reset_garden();
            screen.feedback = None;
            screen.notice = Some("Garden reset.".to_string());
        }
        KeyCode::Char('m') => {
            let result = screen.app.cycle_mode();
            screen.report(result);
        }
        KeyCode::Char('t') => {
            let result = screen.app.cycle_theme();
            screen.report(result);
        }
        KeyCode::Char('d') => {
            let result = screen.app.cycle_difficulty();
            screen.report(result);
        }
        _ => {}
    }
    screen.refresh_palette();
}

fn render(frame: &mut Frame, screen: &PlayScreen, remaining_seconds: Option<u64>) {
    let area = frame.area();
    let app = &screen.app;
    let theme = &screen.palette;
    let colors = &theme.colors;

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);

    if app.session_over() {
        let popup = centered_rect(60, 50, area);
        frame.render_widget(SessionSummary::new(&app.stats, app.garden, theme), popup);
        return;
    }

    let layout = AppLayout::new(area);

    let mode_label = app.pack.mode_label(&app.mode).unwrap_or(app.mode.as_str());
    let mut header_spans = vec![
        Span::styled(
            format!(" {} ", app.pack.title),
            Style::default()
                .fg(colors.header_fg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " {mode_label} | {} | {} | level {} ",
                app.theme, app.difficulty, app.level
            ),
            Style::default().fg(colors.accent()),
        ),
    ];
    if let Some(seconds) = remaining_seconds {
        header_spans.push(Span::styled(
            format!(" {}:{:02} left", seconds / 60, seconds % 60),
            Style::default().fg(colors.warning()),
        ));
    }
    let header = Paragraph::new(Line::from(header_spans)).block(
        Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.header_bg())),
    );
    frame.render_widget(header, layout.header);

    frame.render_widget(
        QuizCard::new(&app.problem, theme)
            .hinted(app.hinted)
            .feedback(screen.feedback),
        layout.main,
    );

    if let Some(garden_area) = layout.garden {
        let label = format!("Garden level {}", app.level);
        frame.render_widget(
            ProgressBar::new(&label, app.seeds, SEEDS_PER_LEVEL, theme),
            garden_area,
        );
    }

    let footer = match &screen.notice {
        Some(notice) => Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(colors.warning()),
        )),
        None => {
            let mut spans = Vec::new();
            if layout.garden.is_none() {
                spans.push(Span::styled(
                    format!(" {}/{SEEDS_PER_LEVEL} seeds ", app.seeds),
                    Style::default().fg(colors.success()),
                ));
            }
            spans.push(Span::styled(
                format!(" {}", layout.tier.key_hints()),
                Style::default().fg(colors.hint()),
            ));
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(footer), layout.footer);
}
