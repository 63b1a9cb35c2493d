// src/main.rs
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::ResetColor,
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use log::info;

use glyphfield::{Animation, Config, FrameOutcome, RenderStyle, StopHandle, Viewport};

#[derive(Parser, Debug)]
#[command(name = "glyphfield")]
#[command(about = "Flowing metaball glyph field for the terminal", long_about = None)]
struct Args {
    /// rendering style
    #[arg(long, value_enum, default_value_t = RenderStyle::Metaball)]
    style: RenderStyle,

    /// number of flowing forms
    #[arg(long)]
    forms: Option<usize>,

    /// movement speed of the forms
    #[arg(long)]
    speed: Option<f32>,

    /// pull of the central logo
    #[arg(long)]
    attraction: Option<f32>,

    /// drift oscillator scale
    #[arg(long)]
    noise_scale: Option<f32>,

    /// hue drift rate
    #[arg(long)]
    color_shift: Option<f32>,

    /// noise blended into glyph tier edges
    #[arg(long)]
    smoothness: Option<f32>,

    /// initial ms per tick
    #[arg(long)]
    interval: Option<f64>,

    /// slower ~30 Hz profile with calmer motion
    #[arg(long, default_value_t = false)]
    reduced_motion: bool,

    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// hide the centre logo
    #[arg(long, default_value_t = false)]
    no_logo: bool,

    /// show HUD on start
    #[arg(long, default_value_t = false)]
    hud: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let mut cfg = if self.reduced_motion {
            Config::reduced_motion()
        } else {
            Config::default()
        };
        cfg.style = self.style;
        cfg.logo = !self.no_logo;
        cfg.seed = self.seed.unwrap_or_else(rand::random);
        if let Some(v) = self.forms {
            cfg.forms = v;
        }
        if let Some(v) = self.speed {
            cfg.form_speed = v;
        }
        if let Some(v) = self.attraction {
            cfg.attractor_strength = v;
        }
        if let Some(v) = self.noise_scale {
            cfg.noise_scale = v;
        }
        if let Some(v) = self.color_shift {
            cfg.color_shift_speed = v;
        }
        if let Some(v) = self.smoothness {
            cfg.transition_smoothness = v;
        }
        if let Some(v) = self.interval {
            cfg.interval_ms = v;
        }
        cfg
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let hud = args.hud;
    let cfg = args.into_config();
    cfg.validate().context("invalid configuration")?;
    info!("seed {}", cfg.seed);

    let mut out = io::stdout();
    terminal::enable_raw_mode().context("enabling raw mode")?;
    execute!(
        out,
        EnterAlternateScreen,
        DisableLineWrap,
        cursor::Hide,
        Clear(ClearType::All)
    )?;

    let result = run(&mut out, cfg, hud);

    execute!(
        out,
        ResetColor,
        cursor::Show,
        EnableLineWrap,
        LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;

    result
}

fn run(out: &mut Stdout, cfg: Config, hud: bool) -> Result<()> {
    let clock = Instant::now();
    let now_ms = || clock.elapsed().as_secs_f64() * 1000.0;

    let (w, h) = terminal::size().context("reading terminal size")?;
    let viewport = Viewport::from_cells(w, h, &cfg);
    let (mut anim, stop) = Animation::start(cfg.clone(), viewport, now_ms());
    anim.show_hud = hud;

    // Raw mode turns a typed Ctrl+C into a key event; this covers SIGINT and
    // SIGTERM sent from outside.
    let on_signal = stop.clone();
    ctrlc::set_handler(move || on_signal.stop()).context("installing signal handler")?;

    loop {
        let wait = Duration::from_secs_f64(anim.idle_ms(now_ms()) / 1000.0);
        if event::poll(wait)? {
            handle_event(event::read()?, &mut anim, &stop, &cfg, now_ms());
        }

        match anim.frame(now_ms()) {
            FrameOutcome::Stopped => return Ok(()),
            FrameOutcome::Skipped => continue,
            FrameOutcome::Rendered => {
                queue!(out, BeginSynchronizedUpdate)?;
                anim.present(out)?;
                queue!(out, ResetColor, EndSynchronizedUpdate)?;
                out.flush()?;
            }
        }
    }
}

fn handle_event(ev: Event, anim: &mut Animation, stop: &StopHandle, cfg: &Config, now: f64) {
    match ev {
        Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => stop.stop(),
            KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => stop.stop(),
            KeyCode::Char(' ') => anim.paused = !anim.paused,
            KeyCode::Char('h') => anim.show_hud = !anim.show_hud,
            KeyCode::Char('s') => {
                let sim = anim.simulation_mut();
                let next = sim.style().next();
                sim.set_style(next);
            }
            _ => {}
        },
        Event::Resize(w, h) => anim.request_resize(Viewport::from_cells(w, h, cfg), now),
        _ => {}
    }
}
