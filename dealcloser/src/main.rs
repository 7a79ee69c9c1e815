//! DealCloser command-line interface.
//!
//! Generates channel-appropriate sales outreach drafts from ICP and offer
//! documents plus command-line overrides, either from built-in templates or
//! through an OpenAI-compatible generation service.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use dealcloser::core::channel::{ChannelId, ChannelRule, rule_for};
use dealcloser::core::context::RawFields;
use dealcloser::core::render::TemplateRenderer;
use dealcloser::core::types::{Mode, RefineStrategy};
use dealcloser::error::DealError;
use dealcloser::exit_codes;
use dealcloser::io::config::{CONFIG_FILE, DealConfig, load_config};
use dealcloser::io::data::{
    IcpDocument, OfferDocument, documents_to_fields, load_document, load_template_overrides,
};
use dealcloser::io::refine::{HttpTransport, RefinementClient, credential_from_env};
use dealcloser::io::sink::{Destination, FileNaming, FileTarget, OutputSink};
use dealcloser::logging;
use dealcloser::pipeline::{Pipeline, RefineSettings};

#[derive(Debug, Parser)]
#[command(
    name = "dealcloser",
    version,
    about = "Channel-aware sales outreach message generator"
)]
struct Cli {
    /// Config file (defaults to `dealcloser.toml` in the working directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an outreach message for one channel (or every channel).
    Generate(GenerateArgs),
    /// Print liveness and whether a generation-service credential is set.
    Health,
    /// List channel rules and which channels have a template.
    Channels,
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    /// Target channel (email, linkedin, telegram, instagram, whatsapp, dm).
    #[arg(short, long)]
    channel: Option<String>,

    /// Generate every channel the selected mode can serve.
    #[arg(long, conflicts_with = "channel")]
    all: bool,

    /// ICP document (YAML). Must exist when given.
    #[arg(long)]
    icp: Option<PathBuf>,

    /// Offer document (YAML). Must exist when given.
    #[arg(long)]
    offer: Option<PathBuf>,

    /// Output directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Refine through the generation service instead of the static template.
    #[arg(long)]
    use_llm: bool,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Recipient name.
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    company: Option<String>,

    /// Recipient handle or Instagram profile URL.
    #[arg(long)]
    handle: Option<String>,

    #[arg(long)]
    objective: Option<String>,

    /// Pain points, one per line.
    #[arg(long)]
    pain_points: Option<String>,

    /// Offer text (overrides the offer document).
    #[arg(long)]
    offer_text: Option<String>,

    /// Benefits, one per line.
    #[arg(long)]
    benefits: Option<String>,

    #[arg(long)]
    tone: Option<String>,

    /// Sender identity.
    #[arg(long)]
    sender: Option<String>,

    #[arg(long)]
    emojis: bool,

    #[arg(long)]
    linebreaks: bool,

    /// Name files `dealcloser_<channel>_<mode>_<timestamp>.txt` instead of
    /// replacing `<channel>.txt`.
    #[arg(long)]
    timestamped: bool,

    /// Also print the message to stdout.
    #[arg(long)]
    print: bool,

    /// Print the message without writing a file.
    #[arg(long, conflicts_with_all = ["timestamped", "out"])]
    no_write: bool,

    /// Print each result as a JSON object instead of plain text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Compose,
    Rewrite,
}

impl From<StrategyArg> for RefineStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Compose => RefineStrategy::Compose,
            StrategyArg::Rewrite => RefineStrategy::Rewrite,
        }
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    logging::init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(exit_codes::for_error(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_cli_config(cli.config.as_deref())?;
    match cli.command {
        Command::Generate(args) => cmd_generate(&config, args),
        Command::Health => cmd_health(&config),
        Command::Channels => cmd_channels(&config),
    }
}

/// An explicitly named config must exist; the default one is optional.
fn load_cli_config(path: Option<&Path>) -> Result<DealConfig> {
    match path {
        Some(path) => {
            if !path.is_file() {
                bail!("config not found: {}", path.display());
            }
            load_config(path)
        }
        None => load_config(Path::new(CONFIG_FILE)),
    }
}

fn build_renderer(config: &DealConfig) -> Result<TemplateRenderer> {
    match &config.templates_dir {
        Some(dir) => {
            let overrides = load_template_overrides(dir)?;
            TemplateRenderer::with_overrides(overrides)
                .with_context(|| format!("load templates from {}", dir.display()))
        }
        None => Ok(TemplateRenderer::builtin()),
    }
}

/// Refinement client over the process-wide HTTP transport, with the
/// credential read from the configured environment variable.
fn refinement_client(config: &DealConfig) -> Result<RefinementClient<&'static HttpTransport>> {
    let transport = HttpTransport::shared(&config.api).map_err(DealError::from)?;
    Ok(RefinementClient::new(
        transport,
        credential_from_env(&config.api.api_key_env),
        config.api.api_key_env.clone(),
    ))
}

fn cmd_generate(config: &DealConfig, args: GenerateArgs) -> Result<()> {
    let mode = if args.use_llm {
        Mode::LlmRefine
    } else {
        Mode::Template
    };
    let settings = RefineSettings {
        model: args
            .model
            .clone()
            .unwrap_or_else(|| config.refine.model.clone()),
        temperature: args.temperature.unwrap_or(config.refine.temperature),
        strategy: args
            .strategy
            .map(RefineStrategy::from)
            .unwrap_or(config.refine.strategy),
    };

    let icp: IcpDocument = load_document(
        args.icp.as_deref().unwrap_or(&config.icp_path),
        args.icp.is_some(),
    )?;
    let offer: OfferDocument = load_document(
        args.offer.as_deref().unwrap_or(&config.offer_path),
        args.offer.is_some(),
    )?;
    let base = documents_to_fields(icp, offer).overlay(field_overrides(&args));

    let pipeline = Pipeline::new(
        build_renderer(config)?,
        refinement_client(config)?,
        config.context_defaults(),
        settings,
    );

    let channels: Vec<Option<String>> = if args.all {
        pipeline
            .channels_for(mode)
            .into_iter()
            .map(|channel| Some(channel.to_string()))
            .collect()
    } else {
        vec![args.channel.clone()]
    };
    let destination = destination(config, &args);
    debug!(?destination, count = channels.len(), mode = %mode, "generating");

    let display: Box<dyn Write> = if args.json {
        Box::new(std::io::sink())
    } else {
        Box::new(std::io::stdout())
    };
    let mut sink = OutputSink::new(display);
    for channel in channels {
        let raw = RawFields {
            channel,
            ..base.clone()
        };
        let (result, receipt) = pipeline.run(&raw, mode, &mut sink, &destination)?;
        if args.json {
            println!(
                "{}",
                serde_json::to_string(&result).context("serialize result")?
            );
        }
        if let Some(path) = receipt.path {
            eprintln!("wrote {}", path.display());
        }
    }
    info!(mode = %mode, "generate finished");
    Ok(())
}

fn field_overrides(args: &GenerateArgs) -> RawFields {
    RawFields {
        channel: None,
        recipient_name: args.name.clone(),
        company: args.company.clone(),
        handle: args.handle.clone(),
        objective: args.objective.clone(),
        pain_points: args.pain_points.clone(),
        offer: args.offer_text.clone(),
        benefits: args.benefits.clone(),
        tone: args.tone.clone(),
        sender_name: args.sender.clone(),
        use_emojis: args.emojis,
        use_linebreaks: args.linebreaks,
    }
}

fn destination(config: &DealConfig, args: &GenerateArgs) -> Destination {
    if args.no_write {
        return Destination::Display;
    }
    let target = FileTarget {
        dir: args.out.clone().unwrap_or_else(|| config.output_dir.clone()),
        naming: if args.timestamped {
            FileNaming::Timestamped
        } else {
            FileNaming::Channel
        },
    };
    if args.print {
        Destination::Both(target)
    } else {
        Destination::File(target)
    }
}

fn cmd_health(config: &DealConfig) -> Result<()> {
    let has_key = refinement_client(config)?.has_credential();
    println!("{}", serde_json::json!({ "ok": true, "has_key": has_key }));
    Ok(())
}

fn cmd_channels(config: &DealConfig) -> Result<()> {
    let renderer = build_renderer(config)?;
    for channel in ChannelId::ALL {
        println!("{}", describe(rule_for(channel), renderer.has_template(channel)));
    }
    Ok(())
}

fn describe(rule: &ChannelRule, has_template: bool) -> String {
    let template = if has_template { "yes" } else { "no" };
    let max_chars = rule
        .max_chars
        .map_or_else(|| "-".to_string(), |max| max.to_string());
    format!(
        "{}\ttemplate={template}\tmax_chars={max_chars}\t{}",
        rule.channel, rule.length
    )
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn generate(args: &[&str]) -> GenerateArgs {
        let argv = ["dealcloser", "generate"].into_iter().chain(args.iter().copied());
        match Cli::try_parse_from(argv).expect("parse").command {
            Command::Generate(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_defaults_write_channel_named_file() {
        let args = generate(&[]);
        assert!(args.channel.is_none());
        assert!(!args.use_llm);
        assert_eq!(
            destination(&DealConfig::default(), &args),
            Destination::File(FileTarget {
                dir: PathBuf::from("out"),
                naming: FileNaming::Channel,
            })
        );
    }

    #[test]
    fn output_flags_select_destination() {
        let config = DealConfig::default();

        let args = generate(&["--print", "--timestamped", "--out", "drafts"]);
        assert_eq!(
            destination(&config, &args),
            Destination::Both(FileTarget {
                dir: PathBuf::from("drafts"),
                naming: FileNaming::Timestamped,
            })
        );

        let args = generate(&["--no-write"]);
        assert_eq!(destination(&config, &args), Destination::Display);
    }

    #[test]
    fn all_conflicts_with_channel() {
        let argv = ["dealcloser", "generate", "--all", "--channel", "email"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn field_flags_become_overrides() {
        let args = generate(&[
            "-c",
            "telegram",
            "--name",
            "Dana",
            "--offer-text",
            "10-minute demo",
            "--emojis",
            "--strategy",
            "rewrite",
        ]);
        let raw = field_overrides(&args);
        assert_eq!(args.channel.as_deref(), Some("telegram"));
        assert_eq!(raw.channel, None);
        assert_eq!(raw.recipient_name.as_deref(), Some("Dana"));
        assert_eq!(raw.offer.as_deref(), Some("10-minute demo"));
        assert!(raw.use_emojis);
        assert_eq!(args.strategy.map(RefineStrategy::from), Some(RefineStrategy::Rewrite));
    }

    #[test]
    fn global_config_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["dealcloser", "health", "--config", "custom.toml"])
            .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn describe_lists_template_and_limit() {
        let line = describe(rule_for(ChannelId::Instagram), true);
        assert!(line.starts_with("instagram\ttemplate=yes\tmax_chars=500"));
        let line = describe(rule_for(ChannelId::Whatsapp), false);
        assert!(line.starts_with("whatsapp\ttemplate=no\tmax_chars=-"));
    }
}
