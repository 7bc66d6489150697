// Unit tests for domain models

use super::*;

#[test]
fn test_media_probe_rejects_non_positive_duration() {
    assert!(matches!(
        MediaProbe::new(0.0, 128_000.0, true),
        Err(DomainError::MalformedMetadata(_))
    ));
    assert!(MediaProbe::new(-3.5, 0.0, false).is_err());
    assert!(MediaProbe::new(f64::NAN, 0.0, false).is_err());
    assert!(MediaProbe::new(f64::INFINITY, 0.0, false).is_err());
}

#[test]
fn test_media_probe_rejects_negative_audio_bitrate() {
    assert!(MediaProbe::new(10.0, -1.0, true).is_err());
}

#[test]
fn test_media_probe_video_only() {
    let probe = MediaProbe::video_only(42.0).unwrap();
    assert_eq!(probe.audio_bitrate_bps, 0.0);
    assert!(!probe.has_audio);
}

#[test]
fn test_size_budget() {
    assert!(SizeBudget::new(0).is_err());

    let budget = SizeBudget::new(5000).unwrap();
    assert_eq!(budget.bytes(), 5_120_000);
    assert!(budget.admits(5_120_000));
    assert!(!budget.admits(5_120_001));
    assert_eq!(budget.to_string(), "5000 KB");
}

#[test]
fn test_pass_mode() {
    assert_eq!(PassMode::from_two_pass(true), PassMode::Two);
    assert_eq!(PassMode::from_two_pass(false), PassMode::Single);
    assert_eq!(PassMode::Two.pass_count(), 2);
    assert_eq!(PassMode::Single.pass_count(), 1);
}

#[test]
fn test_bitrate_plan_rounds_for_encoder() {
    let plan = BitratePlan {
        video_bitrate_bps: 285_891.6,
        audio_bitrate_bps: 32_000.0,
        target_total_bitrate_bps: 317_891.6,
        advisory: None,
    };
    assert_eq!(plan.video_bps(), 285_892);
    assert_eq!(plan.audio_bps(), 32_000);
}

#[test]
fn test_passlog_files_follow_prefix() {
    let attempt = EncodeAttempt {
        input_path: PathBuf::from("/videos/clip.mov"),
        output_path: PathBuf::from("/videos/clipcrunch_.mp4"),
        plan: BitratePlan {
            video_bitrate_bps: 200_000.0,
            audio_bitrate_bps: 64_000.0,
            target_total_bitrate_bps: 264_000.0,
            advisory: None,
        },
        has_audio: true,
        pass_mode: PassMode::Two,
        passlog_prefix: PathBuf::from("/videos/clipcrunch_-passlog"),
    };

    assert_eq!(
        attempt.passlog_files(),
        vec![
            PathBuf::from("/videos/clipcrunch_-passlog-0.log"),
            PathBuf::from("/videos/clipcrunch_-passlog-0.log.mbtree"),
            PathBuf::from("/videos/clipcrunch_-passlog-0.log.temp"),
            PathBuf::from("/videos/clipcrunch_-passlog-0.log.mbtree.temp"),
        ]
    );
}

#[test]
fn test_compression_result_success_rounds_kb_up() {
    let result = CompressionResult::success(PathBuf::from("out.mp4"), 1025, 1);
    match &result {
        CompressionResult::Success { final_size_kb, .. } => assert_eq!(*final_size_kb, 2),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(result.is_success());
    assert_eq!(result.output_path(), Some(&PathBuf::from("out.mp4")));
}

#[test]
fn test_compression_result_json_shape() {
    let rejected = CompressionResult::Rejected {
        reason: RejectionReason::SizeNotReducible {
            attempt: 2,
            previous_size_bytes: 900,
            current_size_bytes: 900,
        },
    };
    let json = serde_json::to_value(&rejected).unwrap();
    assert_eq!(json["status"], "rejected");
    assert_eq!(json["reason"]["kind"], "size_not_reducible");

    let failed = CompressionResult::Failed {
        cause: DomainError::ToolUnavailable {
            tool: "ffmpeg".to_string(),
        },
    };
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["cause"]["kind"], "tool_unavailable");
    assert_eq!(json["cause"]["tool"], "ffmpeg");
}

#[test]
fn test_rejection_messages_are_distinct() {
    let too_small = RejectionReason::BudgetTooSmall {
        target_total_bitrate_bps: 635.8,
        lower_bound_bps: 11_000.0,
    }
    .to_string();
    let stuck = RejectionReason::SizeNotReducible {
        attempt: 2,
        previous_size_bytes: 10,
        current_size_bytes: 10,
    }
    .to_string();
    let missing = DomainError::ToolUnavailable {
        tool: "ffmpeg".to_string(),
    }
    .to_string();

    assert!(too_small.contains("Budget too small"));
    assert!(stuck.contains("Cannot shrink further"));
    assert!(missing.contains("not installed"));
}
