//! pageloader - Main CLI Entry Point

use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use pageloader::{
    cli::{Args, Commands, RunArgs, Verbosity},
    config::Config,
    entrance::{spawn_entrance, EntrancePlan},
    events::{EventBus, LoaderEvent},
    mount::TerminalMount,
    sequencer::{
        PageInputs, ResourceDescriptor, ResourceKind, ResourceSource, SequenceRunner,
        SequencerConfig, Settlement, SimulatedResource,
    },
    telemetry::{TelemetryCollector, TelemetryDisplay},
    widgets::{
        play_reveals, spawn_slider, visibility_ratio, ContactForm, FormSimulator, HeaderState,
        HeroSlider, Intersection, RevealObserver,
    },
};
use rand::Rng;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Simulated page assets with random latency and failures
fn simulated_resources(run: &RunArgs) -> Vec<Box<dyn ResourceSource>> {
    let mut rng = rand::thread_rng();
    let mut resources: Vec<Box<dyn ResourceSource>> = (0..run.resources)
        .map(|i| {
            let (kind, url) = match i % 3 {
                0 => (ResourceKind::Image, format!("/img/asset-{}.jpg", i)),
                1 => (ResourceKind::Stylesheet, format!("/css/asset-{}.css", i)),
                _ => (ResourceKind::Script, format!("/js/asset-{}.js", i)),
            };
            let latency = rng.gen_range(run.min_latency_ms..=run.max_latency_ms);
            let outcome = if rng.gen_bool(run.failure_rate) {
                Settlement::Failed
            } else {
                Settlement::Loaded
            };
            Box::new(SimulatedResource::new(
                ResourceDescriptor::new(kind, url),
                Duration::from_millis(latency),
                outcome,
            )) as Box<dyn ResourceSource>
        })
        .collect();

    if run.hang {
        resources.push(Box::new(SimulatedResource::new(
            ResourceDescriptor::new(ResourceKind::Image, "/img/never.jpg"),
            Duration::from_secs(24 * 60 * 60),
            Settlement::Loaded,
        )));
    }
    resources
}

/// Run a simulated page load in the terminal
async fn run_page(config: &Config, run: &RunArgs, verbosity: Verbosity) -> Result<()> {
    let mut config = config.clone();
    if let Some(ms) = run.min_duration_ms {
        config.loader.min_duration_ms = ms;
    }
    if let Some(ms) = run.exit_delay_ms {
        config.loader.exit_delay_ms = ms;
    }
    config.validate()?;

    let color = config.telemetry.color_output;
    let mount = if verbosity.show_progress() && config.telemetry.show_progress_bars {
        TerminalMount::new("Loading page", color)
    } else {
        TerminalMount::hidden("Loading page")
    };

    let bus = EventBus::new();
    let telemetry = TelemetryCollector::new();

    if verbosity.show_events() {
        let mut events = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if matches!(event, LoaderEvent::Progress { .. }) {
                    continue;
                }
                eprintln!("  {} {}", "·".dimmed(), event.to_string().dimmed());
                if event == LoaderEvent::Complete {
                    break;
                }
            }
        });
    }

    let show_entrance = verbosity.show_progress();
    let entrance = spawn_entrance(&bus, EntrancePlan::from_config(&config.handoff), move |step| {
        if show_entrance {
            println!(
                "  {} {} (+{}ms)",
                "↑".cyan(),
                step.target,
                step.delay.as_millis()
            );
        }
    });

    let runner = SequenceRunner::new(SequencerConfig::from(&config), mount)
        .with_bus(bus)
        .with_telemetry(telemetry.clone());
    let report = runner.run(PageInputs::new(simulated_resources(run))).await?;
    entrance.await?;

    if verbosity.show_progress() {
        println!(
            "{} Loaded in {}ms ({})",
            "✓".green(),
            report.total_duration.as_millis(),
            report.cause.as_str()
        );
        if report.resources_pending > 0 {
            println!(
                "{} {} resource(s) still pending at hand-off",
                "Warning:".yellow().bold(),
                report.resources_pending
            );
        }
    }
    TelemetryDisplay::new(telemetry.clone(), verbosity).display_summary();

    if let Some(path) = &run.export_telemetry {
        std::fs::write(path, telemetry.export_json()?)?;
        if verbosity.show_progress() {
            println!("Telemetry written to {}", path.display());
        }
    }
    Ok(())
}

/// Autoplay the hero slider and print each change
async fn run_slider(config: &Config, slides: usize, seconds: u64) -> Result<()> {
    let (handle, task) = spawn_slider(HeroSlider::new(slides), &config.slider);
    let mut changes = handle.subscribe();
    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    println!("Slide 1/{}", slides);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *changes.borrow_and_update();
                println!("Slide {}/{}", current + 1, slides);
            }
        }
    }

    drop(changes);
    drop(handle);
    task.await?;
    Ok(())
}

/// Walk a contact form through a simulated submission
async fn run_form(config: &Config) -> Result<()> {
    let sim = FormSimulator::new(ContactForm::new("Send Request"), &config.form);
    sim.set_field("name", "Visitor").await;
    sim.set_field("message", "Hello!").await;

    let submission = tokio::spawn({
        let sim = sim.clone();
        async move { sim.submit().await }
    });

    let mut last = None;
    while !submission.is_finished() {
        let form = sim.snapshot().await;
        let label = form.button().label.clone();
        if last.as_ref() != Some(&label) {
            println!("[{}] {}", form.state().as_str(), label);
            last = Some(label);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    submission.await??;

    let form = sim.snapshot().await;
    println!("[{}] {}", form.state().as_str(), form.button().label);
    Ok(())
}

/// Scroll a simulated page top to bottom, revealing sections as they appear
async fn run_scroll(config: &Config, sections: usize, step_px: f64) -> Result<()> {
    const VIEWPORT_PX: f64 = 800.0;
    const FIRST_SECTION_PX: f64 = 700.0;
    const SECTION_PX: f64 = 360.0;

    let mut header = HeaderState::from_config(&config.scroll);
    let mut observer = RevealObserver::new(&config.scroll);
    for i in 0..sections {
        observer.watch(format!(".section-{}", i + 1));
    }

    let page_end = FIRST_SECTION_PX + SECTION_PX * sections as f64;
    let mut scroll_y = 0.0;
    while observer.watching() > 0 && scroll_y <= page_end {
        if header.on_scroll(scroll_y) {
            let state = if header.is_scrolled() { "scrolled" } else { "top" };
            println!("[{:>5.0}px] header {}", scroll_y, state);
        }

        let entries: Vec<Intersection> = (0..sections)
            .map(|element| Intersection {
                element,
                ratio: visibility_ratio(
                    FIRST_SECTION_PX + SECTION_PX * element as f64,
                    SECTION_PX,
                    scroll_y,
                    VIEWPORT_PX,
                ),
            })
            .collect();
        let steps = observer.observe(&entries);
        play_reveals(&steps, |step| {
            println!("[{:>5.0}px] {} {}", scroll_y, "↑".cyan(), step.selector);
        })
        .await;

        tokio::time::sleep(Duration::from_millis(16)).await;
        scroll_y += step_px;
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    if let Some(path) = Config::default_path() {
        println!("# {}", path.display());
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate().map_err(|e| anyhow!(e))?;

    let config = Config::load(args.config.clone())?;
    let verbosity = if args.quiet || args.verbose > 0 {
        args.verbosity()
    } else {
        Verbosity::from_config(&config.telemetry.default_verbosity)
    };

    if args.no_color || !config.telemetry.color_output {
        colored::control::set_override(false);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(verbosity = verbosity.as_str(), "pageloader starting");

    match &args.command {
        Some(Commands::Run(run)) => run_page(&config, run, verbosity).await?,
        Some(Commands::Slider { slides, seconds }) => run_slider(&config, *slides, *seconds).await?,
        Some(Commands::Form) => run_form(&config).await?,
        Some(Commands::Scroll { sections, step_px }) => {
            run_scroll(&config, *sections, *step_px).await?
        }
        Some(Commands::Config) => show_config(&config)?,
        None => run_page(&config, &RunArgs::default(), verbosity).await?,
    }

    Ok(())
}
