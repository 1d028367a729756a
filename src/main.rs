use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voxcart::speech::{AudioCapture, rms_energy};
use voxcart::{App, Config};

/// Voxcart - voice command gateway for an accessible storefront
#[derive(Parser)]
#[command(name = "voxcart", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for machines without audio hardware)
    #[arg(long, env = "VOXCART_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive console: type commands as you would speak them
    Run,
    /// Start a streaming conversation with the voice agent
    Talk,
    /// Resolve a transcript and print the matched intent
    Parse {
        /// The transcript to resolve
        transcript: String,
    },
    /// Speak a line through the configured TTS provider
    Say {
        /// Text to speak
        #[arg(default_value = "Welcome to the store. Say help to hear what you can do.")]
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output with a short tone
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voxcart=info",
        1 => "info,voxcart=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Talk) => {
            let app = App::new(config, cli.disable_voice)?;
            app.run_conversation().await?;
        }
        Some(Command::Parse { transcript }) => cmd_parse(&transcript),
        Some(Command::Say { text }) => cmd_say(&config, &text).await?,
        Some(Command::TestMic { duration }) => test_mic(duration).await?,
        Some(Command::TestSpeaker) => test_speaker().await?,
        Some(Command::Run) | None => {
            let mut app = App::new(config, cli.disable_voice)?;
            tracing::info!(
                chord = %app.config.shortcuts.push_to_talk,
                voice = app.speech.is_some(),
                "voxcart gateway ready"
            );
            app.run_console().await?;
        }
    }

    Ok(())
}

/// Print the resolver's decision for a transcript
fn cmd_parse(transcript: &str) {
    let resolver = voxcart::IntentResolver::new();
    match resolver.parse(transcript) {
        Some(command) => {
            println!("rule:       {}", command.matched_rule);
            println!("intent:     {:?}", command.intent);
            println!("confidence: {}", command.confidence);
        }
        None => println!("no match; the dense local ruleset may still handle it"),
    }
}

/// Speak a line through the configured TTS provider
async fn cmd_say(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Synthesizing: \"{text}\"");
    let gateway = voxcart::SpeechGateway::new(config)?;
    gateway.speak(text).await?;
    println!("Done. If you heard the line, speech output is working.");
    Ok(())
}

/// Test microphone input with a level meter
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working.");
    println!("If RMS stayed near 0, check your input device and permissions.");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = voxcart::speech::AudioPlayback::new()?;

    // 2 seconds of 440Hz sine at the playback rate, 30% volume
    let sample_rate = 24000_usize;
    let frequency = 440.0_f32;
    let num_samples = sample_rate * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());
    playback
        .play_pcm(samples, Arc::new(AtomicBool::new(false)))
        .await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working.");

    Ok(())
}
