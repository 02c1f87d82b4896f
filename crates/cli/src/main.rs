use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use watchguard_core::alarm::domain::decision::AlarmDecision;
use watchguard_core::alarm::domain::reference_cache::ReferenceCache;
use watchguard_core::alarm::domain::watch_task::{DistinguishingData, WatchTask};
use watchguard_core::detection::domain::face_detector::{DetectorStatus, FaceDetector};
use watchguard_core::detection::infrastructure::cascade_detector::CascadeFaceDetector;
use watchguard_core::fingerprint::domain::fingerprint::{Fingerprint, FingerprintAlgorithm};
use watchguard_core::fingerprint::infrastructure::image_hasher::ImageHasher;
use watchguard_core::media::domain::image_source::ImageSource;
use watchguard_core::media::infrastructure::image_file_reader::{expand_image_paths, ImageFileReader};
use watchguard_core::media::infrastructure::image_file_writer::ImageFileWriter;
use watchguard_core::pipeline::audit_logger::{AuditLogger, LogAuditLogger};
use watchguard_core::pipeline::evaluate_alarm_use_case::EvaluateAlarmUseCase;
use watchguard_core::shared::frame::Frame;
use watchguard_core::shared::settings::Settings;

/// Raise an alarm when any candidate image shows the watch-list face.
#[derive(Parser, Debug)]
#[command(name = "watchguard")]
struct Cli {
    /// Candidate images, or directories of images.
    #[arg(required = true)]
    candidates: Vec<PathBuf>,

    /// Watch-list reference image.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Previously printed reference fingerprint (e.g. a:0f0f0f0f0f0f0f0f).
    #[arg(long)]
    reference_hash: Option<String>,

    /// Sensitivity level, 0-3.
    #[arg(long, allow_negative_numbers = true)]
    level: i64,

    /// Candidate identifiers (comma-separated). Defaults to file names.
    #[arg(long, value_delimiter = ',')]
    ids: Option<Vec<String>>,

    /// Cascade file to try before the default locations. Repeatable.
    #[arg(long)]
    cascade: Vec<PathBuf>,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save every detected face crop to this directory.
    #[arg(long)]
    save_crops: Option<PathBuf>,

    /// Minimum detection score for a face to be compared.
    #[arg(long)]
    confidence: Option<f64>,

    /// Fingerprint algorithm: average or difference.
    #[arg(long)]
    algorithm: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let settings = build_settings(&cli)?;

    let detector = CascadeFaceDetector::load(&settings);
    if let DetectorStatus::Ready { trees, depth } = detector.status() {
        log::info!("Cascade loaded: {trees} trees of depth {depth}");
    }

    let mut use_case = EvaluateAlarmUseCase::new(
        Arc::new(detector),
        Arc::new(ImageHasher::new(settings.algorithm)),
        &settings,
    )?;
    if let Some(dir) = &settings.save_crops {
        use_case = use_case.with_crop_writer(Box::new(ImageFileWriter::new()), dir.clone());
    }

    let reader = ImageFileReader::new();
    let task = build_task(&cli, &settings, &reader)?;

    let mut logger = LogAuditLogger::new();
    let decision = use_case.execute(&task, &mut logger)?;
    logger.summary();

    match task.reference.cached_fingerprint() {
        Some(fp) => println!("reference {fp}"),
        None => println!("reference none"),
    }
    println!("{}", describe(&decision));
    Ok(())
}

fn build_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut cascade_paths = cli.cascade.clone();
    cascade_paths.append(&mut settings.cascade_paths);
    settings.cascade_paths = cascade_paths;

    if let Some(confidence) = cli.confidence {
        settings.confidence_threshold = confidence;
    }
    if let Some(dir) = &cli.save_crops {
        settings.save_crops = Some(dir.clone());
    }
    if let Some(name) = &cli.algorithm {
        settings.algorithm = parse_algorithm(name)?;
    }

    settings.validate()?;
    log::debug!("Effective settings:\n{}", settings.to_json()?);
    Ok(settings)
}

fn build_task(
    cli: &Cli,
    settings: &Settings,
    reader: &dyn ImageSource,
) -> Result<WatchTask, Box<dyn std::error::Error>> {
    let reference_image = match &cli.reference {
        Some(path) => Some(reader.read(path)?),
        None => None,
    };

    let reference = match &cli.reference_hash {
        Some(text) => {
            let fp: Fingerprint = text.parse()?;
            if fp.algorithm() != settings.algorithm {
                return Err(format!(
                    "--reference-hash is a {} fingerprint but candidates use {}",
                    fp.algorithm(),
                    settings.algorithm
                )
                .into());
            }
            let cache = Arc::new(ReferenceCache::with_fingerprint(fp));
            DistinguishingData::with_cache(reference_image, cache)
        }
        None => match reference_image {
            Some(image) => DistinguishingData::from_image(image),
            None => return Err("--reference or --reference-hash is required".into()),
        },
    };

    let paths = expand_image_paths(&cli.candidates)?;
    let identifiers = match &cli.ids {
        Some(ids) => ids.clone(),
        None => paths.iter().map(|p| identifier_for(p)).collect(),
    };

    let candidates: Vec<Option<Frame>> = paths
        .iter()
        .map(|path| match reader.read(path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("Could not read candidate: {e}");
                None
            }
        })
        .collect();

    Ok(WatchTask::from_slots(reference, candidates, identifiers, cli.level))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.reference.is_none() && cli.reference_hash.is_none() {
        return Err("--reference or --reference-hash is required".into());
    }
    if let Some(path) = &cli.reference {
        if !path.exists() {
            return Err(format!("Reference image not found: {}", path.display()).into());
        }
    }
    for path in &cli.candidates {
        if !path.exists() {
            return Err(format!("Candidate not found: {}", path.display()).into());
        }
    }
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn parse_algorithm(name: &str) -> Result<FingerprintAlgorithm, Box<dyn std::error::Error>> {
    match name {
        "average" => Ok(FingerprintAlgorithm::Average),
        "difference" => Ok(FingerprintAlgorithm::Difference),
        other => Err(format!("Algorithm must be 'average' or 'difference', got '{other}'").into()),
    }
}

fn identifier_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn describe(decision: &AlarmDecision) -> String {
    let mut line = match &decision.matched {
        Some(m) if decision.is_alarm() => format!("ALARM {} similarity {:.4}", m.id, m.similarity),
        _ => "no alarm".to_string(),
    };
    if let Some(reason) = &decision.degraded {
        line.push_str(&format!(" ({reason})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchguard_core::alarm::domain::decision::{Degradation, MatchedCandidate};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parses_full_command_line() {
        let cli = parse(&[
            "watchguard",
            "--reference",
            "ref.jpg",
            "--level",
            "2",
            "--ids",
            "a,b",
            "--cascade",
            "one",
            "--cascade",
            "two",
            "c1.jpg",
            "c2.jpg",
        ]);
        assert_eq!(cli.level, 2);
        assert_eq!(cli.ids, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(cli.cascade, vec![PathBuf::from("one"), PathBuf::from("two")]);
        assert_eq!(cli.candidates.len(), 2);
    }

    #[test]
    fn test_negative_level_reaches_the_evaluator() {
        let cli = parse(&["watchguard", "--reference", "r.jpg", "--level", "-1", "c.jpg"]);
        assert_eq!(cli.level, -1);
    }

    #[test]
    fn test_candidates_are_required() {
        assert!(Cli::try_parse_from(["watchguard", "--reference", "r.jpg", "--level", "1"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config_values() {
        let cli = parse(&[
            "watchguard",
            "--reference",
            "r.jpg",
            "--level",
            "1",
            "--confidence",
            "2.5",
            "--algorithm",
            "difference",
            "--cascade",
            "mine",
            "c.jpg",
        ]);
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.confidence_threshold, 2.5);
        assert_eq!(settings.algorithm, FingerprintAlgorithm::Difference);
        assert_eq!(settings.cascade_paths, vec![PathBuf::from("mine")]);
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        assert!(parse_algorithm("perceptual").is_err());
    }

    #[test]
    fn test_identifier_defaults_to_file_name() {
        assert_eq!(identifier_for(Path::new("/feeds/cam-3.jpg")), "cam-3.jpg");
    }

    #[test]
    fn test_describe_alarm_and_degradation() {
        let alarm = AlarmDecision {
            alarm: true,
            matched: Some(MatchedCandidate {
                index: 0,
                id: "cam-1".into(),
                similarity: 0.96,
            }),
            threshold: 0.8,
            compared: 1,
            degraded: None,
        };
        assert_eq!(describe(&alarm), "ALARM cam-1 similarity 0.9600");

        let none = AlarmDecision {
            alarm: false,
            matched: None,
            threshold: 0.8,
            compared: 0,
            degraded: Some(Degradation::NoReferenceFace),
        };
        assert_eq!(describe(&none), "no alarm (no face in reference image)");
    }
}
