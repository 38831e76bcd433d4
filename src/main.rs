use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::info;

use chapter_gen::config::Config;
use chapter_gen::extract::SegmentExtractor;
use chapter_gen::indexing::{IndexingJobClient, LogSink};
use chapter_gen::splitter::LongVideoSplitter;
use chapter_gen::timeline;
use chapter_gen::video::FfmpegTools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chapter_gen=info,warn".into()),
        )
        .init();

    let matches = Command::new("chapter-gen")
        .version("0.1.0")
        .about("Chapter timestamp generator backed by a video indexing service")
        .subcommand_required(true)
        .subcommand(
            Command::new("generate")
                .about("Generate a chapter timeline for a video")
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .value_name("PATH")
                        .help("Video file to upload and index"),
                )
                .arg(
                    Arg::new("video-id")
                        .long("video-id")
                        .value_name("ID")
                        .help("Already-indexed video to summarize instead of uploading"),
                ),
        )
        .subcommand(Command::new("list").about("List previously indexed videos (newest first)"))
        .subcommand(
            Command::new("clips")
                .about("Cut an indexed video into per-chapter clips")
                .arg(
                    Arg::new("video-id")
                        .long("video-id")
                        .value_name("ID")
                        .required(true)
                        .help("Indexed video to cut"),
                )
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .value_name("DIR")
                        .help("Output directory for clips (defaults to config)"),
                )
                .arg(
                    Arg::new("print-timeline")
                        .long("print-timeline")
                        .help("Also print the timeline before cutting")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let config = Config::load()?;
    config.validate()?;

    match matches.subcommand() {
        Some(("generate", sub)) => {
            let file = sub.get_one::<String>("file");
            let video_id = sub.get_one::<String>("video-id");
            generate(&config, file, video_id).await
        }
        Some(("list", _)) => list(&config).await,
        Some(("clips", sub)) => {
            let video_id = sub.get_one::<String>("video-id").cloned().unwrap_or_default();
            let out_dir = sub
                .get_one::<String>("out")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.extraction.output_dir.clone());
            let print_timeline = sub.get_flag("print-timeline");
            clips(&config, &video_id, out_dir, print_timeline).await
        }
        _ => unreachable!("subcommand required"),
    }
}

async fn generate(config: &Config, file: Option<&String>, video_id: Option<&String>) -> Result<()> {
    let client = IndexingJobClient::new(config.api.clone());

    let timeline = match (file, video_id) {
        (Some(path), None) => {
            let splitter =
                LongVideoSplitter::new(client, FfmpegTools::new(), config.splitting.clone());
            splitter
                .generate_timeline(PathBuf::from(path).as_path(), &LogSink)
                .await?
        }
        (None, Some(id)) => {
            use chapter_gen::indexing::Indexer;
            let chapters = client.summarize_chapters(id).await?;
            let assembled = timeline::assemble(&chapters, 0)?;
            chapter_gen::timeline::Timeline {
                text: assembled.text,
                covered_until: assembled.new_origin,
            }
        }
        _ => return Err(anyhow!("provide exactly one of --file or --video-id")),
    };

    info!("🎉 Timeline covers up to {}s", timeline.covered_until);
    println!("{}", timeline.text);
    Ok(())
}

async fn list(config: &Config) -> Result<()> {
    let client = IndexingJobClient::new(config.api.clone());
    let videos = client.list_videos().await?;

    if videos.is_empty() {
        println!("No indexed videos found.");
        return Ok(());
    }

    for video in videos {
        println!("{}  {}", video.id, video.filename);
    }
    Ok(())
}

async fn clips(config: &Config, video_id: &str, out_dir: PathBuf, print_timeline: bool) -> Result<()> {
    use chapter_gen::indexing::Indexer;

    let client = IndexingJobClient::new(config.api.clone());

    let streaming_url = client
        .streaming_url(video_id)
        .await?
        .ok_or_else(|| anyhow!("video {} has no HLS rendition to download from", video_id))?;

    let chapters = client.summarize_chapters(video_id).await?;
    let assembled = timeline::assemble(&chapters, 0)?;

    if print_timeline {
        println!("{}", assembled.text);
    }

    let extractor = SegmentExtractor::new(reqwest::Client::new(), FfmpegTools::new(), out_dir);
    let mut produced = extractor.extract_clips(assembled.text, streaming_url);

    while let Some(item) = produced.recv().await {
        match item {
            Ok(path) => println!("{}", path.display()),
            Err(e) => return Err(e.into()),
        }
    }

    info!("🎉 Clip extraction finished");
    Ok(())
}
