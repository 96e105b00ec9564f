//! Declarative-to-imperative command planning.
//!
//! The planner turns a task's processing configuration plus the probed media
//! metadata into an ordered list of fully-resolved engine invocations. All
//! knowledge about flag ordering, filter composition, and codec selection
//! lives here; nothing downstream inspects the configuration again.
//!
//! Special forms take exclusive precedence, first match wins:
//! animated-image → split → join → archive extraction → general transcode.
//! When a task carries both a special form and general-form options (say, a
//! GIF request plus a quality profile), the general options are ignored for
//! that task. This is a deliberate tie-break, not an oversight: the special
//! forms produce a different artifact class and the general knobs do not
//! compose with them.

use std::path::Path;

use tracing::debug;

use mediaforge_core::config::engine::EngineConfig;
use mediaforge_entity::processing::{AudioCodec, GifSpec, SplitSpec};
use mediaforge_entity::task::model::Task;
use mediaforge_entity::task::status::TaskKind;

use crate::error::EngineError;
use crate::extract::extraction_step;
use crate::plan::{Plan, Step};
use crate::probe::MediaInfo;

const DEFAULT_GIF_DURATION: f64 = 5.0;
const DEFAULT_GIF_FPS: u32 = 15;
const GIF_SCALE_WIDTH: u32 = 480;

/// Everything the planner needs to resolve one task into commands.
#[derive(Debug)]
pub struct PlanRequest<'a> {
    /// The task being planned.
    pub task: &'a Task,
    /// Probed metadata of the acquired source.
    pub media: &'a MediaInfo,
    /// Local path of the acquired source.
    pub input: &'a Path,
    /// Declared output artifact path (pattern path for splits, directory for
    /// archive extraction).
    pub output: &'a Path,
    /// Acquired external audio track, when the config adds one.
    pub side_audio: Option<&'a Path>,
    /// Acquired external subtitle track, when the config adds one.
    pub side_subtitle: Option<&'a Path>,
    /// Concat list file for join tasks, written by the caller.
    pub concat_list: Option<&'a Path>,
}

/// Builds execution plans for the external media engine.
#[derive(Debug, Clone)]
pub struct CommandPlanner {
    ffmpeg_path: String,
}

impl CommandPlanner {
    /// Create a planner from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
        }
    }

    /// Resolve a task into an ordered plan.
    pub fn plan(&self, request: &PlanRequest<'_>) -> Result<Plan, EngineError> {
        let config = &request.task.config;

        let plan = if request.task.kind == TaskKind::Gif || config.gif.is_some() {
            self.plan_gif(request)?
        } else if let Some(split) = config.split {
            self.plan_split(request, split)?
        } else if request.task.kind == TaskKind::Join {
            self.plan_join(request)?
        } else if request.task.kind == TaskKind::Archive {
            Plan::new(vec![extraction_step(request.input, request.output)?])
        } else if request.task.kind == TaskKind::Document {
            // Documents pass through untouched; rename and caption are
            // applied at egress.
            Plan::default()
        } else {
            self.plan_general(request)?
        };

        debug!(
            task_id = %request.task.id,
            steps = plan.len(),
            "Planned task"
        );
        Ok(plan)
    }

    /// Output file name for a task, before the workspace path is joined on.
    ///
    /// Centralizes the container-extension decisions so the processor does
    /// not duplicate planner knowledge.
    pub fn output_file_name(task: &Task, media: &MediaInfo) -> String {
        let display = task.display_name();
        let stem = Path::new(&display)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string();
        let source_ext = Path::new(&display)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4")
            .to_string();

        let config = &task.config;
        if task.kind == TaskKind::Gif || config.gif.is_some() {
            format!("{stem}.gif")
        } else if config.split.is_some() {
            format!("{stem}_%03d.{source_ext}")
        } else if task.kind == TaskKind::Archive {
            format!("{stem}_extracted")
        } else if task.kind == TaskKind::Audio || (!media.has_video() && media.has_audio()) {
            let codec = config.audio_codec.unwrap_or(AudioCodec::Mp3);
            format!("{stem}.{}", codec.extension())
        } else if config.quality.is_some() {
            // Re-encoded video always lands in an mp4 container.
            format!("{stem}.mp4")
        } else {
            format!("{stem}.{source_ext}")
        }
    }

    /// Two-step palette plan: generate a reduced palette over the requested
    /// window, then extract frames and apply it. Both steps share the same
    /// window and fps/scale filter chain.
    fn plan_gif(&self, request: &PlanRequest<'_>) -> Result<Plan, EngineError> {
        if !request.media.has_video() {
            return Err(EngineError::InvalidPlan {
                reason: "animated-image output requires a video stream".to_string(),
            });
        }

        let default_spec = GifSpec {
            start: None,
            duration_secs: None,
            fps: None,
        };
        let spec = request.task.config.gif.as_ref().unwrap_or(&default_spec);
        let fps = spec.fps.unwrap_or(DEFAULT_GIF_FPS);
        let duration = spec.duration_secs.unwrap_or(DEFAULT_GIF_DURATION);

        let mut window: Vec<String> = Vec::new();
        if let Some(start) = &spec.start {
            window.push("-ss".into());
            window.push(start.clone());
        }
        window.push("-t".into());
        window.push(format_seconds(duration));

        let filters = format!("fps={fps},scale={GIF_SCALE_WIDTH}:-1:flags=lanczos");
        let palette = request
            .output
            .with_file_name(format!(
                "{}_palette.png",
                request
                    .output
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("gif")
            ));
        let input = path_str(request.input);

        let mut palette_args = command_prefix();
        palette_args.extend(window.iter().cloned());
        palette_args.extend([
            "-i".into(),
            input.clone(),
            "-vf".into(),
            format!("{filters},palettegen"),
            path_str(&palette),
        ]);

        let mut render_args = command_prefix();
        render_args.extend(window);
        render_args.extend([
            "-i".into(),
            input,
            "-i".into(),
            path_str(&palette),
            "-filter_complex".into(),
            format!("{filters}[x];[x][1:v]paletteuse"),
            path_str(request.output),
        ]);

        Ok(Plan::new(vec![
            Step {
                program: self.ffmpeg_path.clone(),
                args: palette_args,
                output: palette,
                label: "palettegen",
            },
            Step {
                program: self.ffmpeg_path.clone(),
                args: render_args,
                output: request.output.to_path_buf(),
                label: "paletteuse",
            },
        ]))
    }

    /// Single segmenting step. Duration criteria cut on keyframe-aligned
    /// boundaries with stream copy; size criteria are converted to an
    /// estimated duration from the probed container stats and stay
    /// best-effort (exact byte counts are out of scope).
    fn plan_split(
        &self,
        request: &PlanRequest<'_>,
        split: SplitSpec,
    ) -> Result<Plan, EngineError> {
        let seconds = match split {
            SplitSpec::Duration { seconds } => f64::from(seconds),
            SplitSpec::Size { bytes } => estimate_segment_seconds(bytes, request.media)?,
        };

        let map_spec = if request.task.config.is_muted() {
            "0:v"
        } else {
            "0"
        };

        let mut args = command_prefix();
        args.extend([
            "-i".into(),
            path_str(request.input),
            "-c".into(),
            "copy".into(),
            "-map".into(),
            map_spec.into(),
            "-f".into(),
            "segment".into(),
            "-segment_time".into(),
            format_seconds(seconds),
            "-reset_timestamps".into(),
            "1".into(),
            path_str(request.output),
        ]);

        Ok(Plan::new(vec![Step {
            program: self.ffmpeg_path.clone(),
            args,
            output: request.output.to_path_buf(),
            label: "segment",
        }]))
    }

    /// Concat-demuxer join over a caller-written list file, stream copy.
    fn plan_join(&self, request: &PlanRequest<'_>) -> Result<Plan, EngineError> {
        let list = request.concat_list.ok_or_else(|| EngineError::InvalidPlan {
            reason: "join task has no concat list".to_string(),
        })?;

        let mut args = command_prefix();
        args.extend([
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            path_str(list),
            "-c".into(),
            "copy".into(),
            path_str(request.output),
        ]);

        Ok(Plan::new(vec![Step {
            program: self.ffmpeg_path.clone(),
            args,
            output: request.output.to_path_buf(),
            label: "concat",
        }]))
    }

    /// The general transcode form, assembled left-to-right: input-seek trim,
    /// side inputs, filters, codec selection, track mapping, output.
    fn plan_general(&self, request: &PlanRequest<'_>) -> Result<Plan, EngineError> {
        let config = &request.task.config;
        let media = request.media;
        let audio_only = request.task.kind == TaskKind::Audio;
        let muted = config.is_muted();

        let mut args = command_prefix();

        // Input-seek trim ahead of the primary input: fast, at the cost of
        // keyframe-boundary precision.
        if let Some(trim) = &config.trim {
            args.extend(["-ss".into(), trim.start.clone(), "-to".into(), trim.end.clone()]);
        }

        args.extend(["-i".into(), path_str(request.input)]);

        // Side inputs occupy the next input indices, audio before subtitle.
        let mut next_input = 1u32;
        let audio_input = request.side_audio.map(|path| {
            args.extend(["-i".into(), path_str(path)]);
            let index = next_input;
            next_input += 1;
            index
        });
        let subtitle_input = request.side_subtitle.map(|path| {
            args.extend(["-i".into(), path_str(path)]);
            let index = next_input;
            next_input += 1;
            index
        });

        // Video filter chain.
        let mut video_filters: Vec<String> = Vec::new();
        if !audio_only && media.has_video() {
            if let Some(quality) = config.quality {
                let (w, h) = (quality.width(), quality.height());
                video_filters.push(format!(
                    "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
                ));
            }
            if let Some(text) = &config.watermark {
                video_filters.push(format!(
                    "drawtext=text='{}':x=10:y=h-th-10:fontsize=24:fontcolor=white@0.8",
                    escape_drawtext(text)
                ));
            }
        }

        // Audio filter chain, fixed composition order so identical
        // configurations always produce identical commands.
        let mut audio_filters: Vec<String> = Vec::new();
        if !muted {
            if let Some(set) = &config.audio_filters {
                if set.slowed {
                    audio_filters.push("atempo=0.8".into());
                }
                if set.reverb {
                    audio_filters.push("aecho=0.8:0.9:40|50:0.4|0.3".into());
                }
                if set.eight_d {
                    audio_filters.push("apulsator=hz=0.09".into());
                }
                if let Some(volume) = set.volume {
                    audio_filters.push(format!("volume={volume}"));
                }
                if let Some(bass) = set.bass {
                    audio_filters.push(format!("bass=g={bass}"));
                }
                if let Some(treble) = set.treble {
                    audio_filters.push(format!("treble=g={treble}"));
                }
            }
        }

        if !video_filters.is_empty() {
            args.extend(["-vf".into(), video_filters.join(",")]);
        }
        if !audio_filters.is_empty() {
            args.extend(["-af".into(), audio_filters.join(",")]);
        }

        // Codec selection.
        if audio_only {
            let codec = config.audio_codec.unwrap_or(AudioCodec::Mp3);
            args.extend(["-vn".into(), "-c:a".into(), codec.encoder().into()]);
            if let Some(bitrate) = codec.bitrate() {
                args.extend(["-b:a".into(), bitrate.into()]);
            }
        } else if let Some(quality) = config.quality {
            args.extend([
                "-c:v".into(),
                "libx264".into(),
                "-crf".into(),
                quality.crf().to_string(),
                "-preset".into(),
                quality.preset().into(),
            ]);
            if !muted {
                args.extend([
                    "-c:a".into(),
                    "aac".into(),
                    "-b:a".into(),
                    quality.audio_bitrate().into(),
                ]);
            }
        } else if video_filters.is_empty() && audio_filters.is_empty() {
            // Nothing forces a re-encode: prefer stream copy for speed.
            args.extend(["-c".into(), "copy".into()]);
        } else {
            if video_filters.is_empty() {
                args.extend(["-c:v".into(), "copy".into()]);
            } else {
                args.extend([
                    "-c:v".into(),
                    "libx264".into(),
                    "-crf".into(),
                    "23".into(),
                    "-preset".into(),
                    "fast".into(),
                ]);
            }
            if !muted {
                if audio_filters.is_empty() {
                    args.extend(["-c:a".into(), "copy".into()]);
                } else {
                    args.extend(["-c:a".into(), "aac".into()]);
                }
            }
        }

        // Explicit track mapping, only when the defaults would be wrong:
        // muting drops the audio map; side inputs must be selected by index.
        let needs_maps =
            !audio_only && (muted || audio_input.is_some() || subtitle_input.is_some());
        if needs_maps {
            if media.has_video() {
                args.extend(["-map".into(), "0:v:0".into()]);
            }
            if !muted {
                if let Some(index) = audio_input {
                    args.extend(["-map".into(), format!("{index}:a:0")]);
                } else if media.has_audio() {
                    args.extend(["-map".into(), "0:a:0".into()]);
                }
            }
            if let Some(index) = subtitle_input {
                // Text-track muxing is container-dependent; skip the map
                // entirely where the target cannot carry it.
                if let Some(codec) = subtitle_codec_for(request.output) {
                    args.extend([
                        "-map".into(),
                        format!("{index}:s:0"),
                        "-c:s".into(),
                        codec.into(),
                    ]);
                }
            }
        }

        args.push(path_str(request.output));

        Ok(Plan::new(vec![Step {
            program: self.ffmpeg_path.clone(),
            args,
            output: request.output.to_path_buf(),
            label: "transcode",
        }]))
    }
}

/// Common leading arguments for every ffmpeg invocation.
fn command_prefix() -> Vec<String> {
    vec!["-y".into(), "-hide_banner".into(), "-nostdin".into()]
}

/// Subtitle codec for the target container, `None` when the container has no
/// text-track muxing.
fn subtitle_codec_for(output: &Path) -> Option<&'static str> {
    match output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") | Some("m4v") | Some("mov") => Some("mov_text"),
        Some("mkv") => Some("srt"),
        _ => None,
    }
}

/// Segment length for a size-based split: target bytes over the container's
/// byte rate. Falls back to the probed bitrate when the container size is
/// unknown; unplannable when neither is available.
fn estimate_segment_seconds(target_bytes: u64, media: &MediaInfo) -> Result<f64, EngineError> {
    let seconds = if media.size_bytes > 0 && media.duration_secs > 0.0 {
        target_bytes as f64 * media.duration_secs / media.size_bytes as f64
    } else if media.bit_rate > 0 {
        target_bytes as f64 * 8.0 / media.bit_rate as f64
    } else {
        return Err(EngineError::InvalidPlan {
            reason: "size-based split needs a probed duration or bitrate".to_string(),
        });
    };
    Ok(seconds.max(1.0))
}

/// Render a seconds value without a trailing `.0` for whole numbers.
fn format_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{}", seconds as u64)
    } else {
        format!("{seconds:.3}")
    }
}

/// Escape characters with meaning inside a drawtext filter argument.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    use mediaforge_entity::processing::{AudioFilterSet, ProcessingConfig, TrimRange};
    use mediaforge_entity::task::source::TaskSource;
    use mediaforge_entity::task::status::TaskStatus;

    use crate::probe::{StreamInfo, StreamKind};

    fn task(kind: TaskKind, config: ProcessingConfig) -> Task {
        Task {
            id: Uuid::new_v4(),
            owner_id: 7,
            kind,
            source: Json(TaskSource::Url {
                url: "https://example.com/source.mp4".to_string(),
                format_id: None,
            }),
            config: Json(config),
            status: TaskStatus::Processing,
            cancel_requested: false,
            error_phase: None,
            error_message: None,
            error_log: None,
            worker_id: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    fn media_1080p() -> MediaInfo {
        MediaInfo {
            duration_secs: 120.0,
            size_bytes: 60_000_000,
            bit_rate: 4_000_000,
            streams: vec![
                StreamInfo {
                    kind: StreamKind::Video,
                    codec_name: "h264".to_string(),
                    width: Some(1920),
                    height: Some(1080),
                    bit_rate: Some(3_800_000),
                },
                StreamInfo {
                    kind: StreamKind::Audio,
                    codec_name: "aac".to_string(),
                    width: None,
                    height: None,
                    bit_rate: Some(128_000),
                },
            ],
        }
    }

    fn planner() -> CommandPlanner {
        CommandPlanner::new(&EngineConfig::default())
    }

    fn plan_for(task: &Task, media: &MediaInfo, output: &str) -> Plan {
        let input = PathBuf::from("/work/in.mp4");
        let output = PathBuf::from(output);
        planner()
            .plan(&PlanRequest {
                task,
                media,
                input: &input,
                output: &output,
                side_audio: None,
                side_subtitle: None,
                concat_list: None,
            })
            .expect("plan")
    }

    #[test]
    fn test_gif_plan_has_exactly_two_steps_and_ignores_quality() {
        let mut config = ProcessingConfig::default();
        config.gif = Some(GifSpec {
            start: Some("00:00:03".to_string()),
            duration_secs: Some(4.0),
            fps: Some(12),
        });
        // Precedence: the quality profile must be ignored entirely.
        config.quality =
            Some(serde_json::from_value(serde_json::json!("720p")).expect("profile"));

        let task = task(TaskKind::Video, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out.gif");

        assert_eq!(plan.len(), 2);
        for step in &plan.steps {
            assert!(!step.args.iter().any(|a| a == "libx264"));
            assert!(!step.args.iter().any(|a| a == "-crf"));
            assert!(!step.args.iter().any(|a| a == "-preset"));
            // Shared window on both steps.
            assert!(step.args.iter().any(|a| a == "00:00:03"));
            assert!(step.args.iter().any(|a| a.contains("fps=12")));
        }
        assert_eq!(plan.final_output(), Some(Path::new("/work/out.gif")));
    }

    #[test]
    fn test_gif_requires_video_stream() {
        let mut config = ProcessingConfig::default();
        config.gif = Some(GifSpec {
            start: None,
            duration_secs: None,
            fps: None,
        });
        let task = task(TaskKind::Video, config);
        let media = MediaInfo {
            streams: vec![StreamInfo {
                kind: StreamKind::Audio,
                codec_name: "mp3".to_string(),
                width: None,
                height: None,
                bit_rate: None,
            }],
            ..MediaInfo::default()
        };

        let input = PathBuf::from("/work/in.mp3");
        let output = PathBuf::from("/work/out.gif");
        let err = planner()
            .plan(&PlanRequest {
                task: &task,
                media: &media,
                input: &input,
                output: &output,
                side_audio: None,
                side_subtitle: None,
                concat_list: None,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlan { .. }));
    }

    #[test]
    fn test_mute_maps_no_audio_entry() {
        let mut config = ProcessingConfig::default();
        config.mute = Some(true);
        let task = task(TaskKind::Video, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out.mp4");

        for step in &plan.steps {
            let maps: Vec<&String> = step
                .args
                .iter()
                .zip(step.args.iter().skip(1))
                .filter(|(flag, _)| *flag == "-map")
                .map(|(_, value)| value)
                .collect();
            assert!(!maps.is_empty());
            assert!(maps.iter().all(|m| !m.contains(":a")));
        }
    }

    #[test]
    fn test_trim_only_uses_input_seek_and_stream_copy() {
        let mut config = ProcessingConfig::default();
        config.trim = Some(TrimRange::try_from("00:00:10-00:00:20".to_string()).expect("trim"));
        let task = task(TaskKind::Video, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out.mp4");

        assert_eq!(plan.len(), 1);
        let args = &plan.steps[0].args;

        let ss = args.iter().position(|a| a == "-ss").expect("-ss present");
        let to = args.iter().position(|a| a == "-to").expect("-to present");
        let input = args.iter().position(|a| a == "-i").expect("-i present");
        assert!(ss < input && to < input, "seek options precede the input");
        assert_eq!(args[ss + 1], "00:00:10");
        assert_eq!(args[to + 1], "00:00:20");

        let copy = args.iter().position(|a| a == "-c").expect("-c present");
        assert_eq!(args[copy + 1], "copy");
        assert!(!args.iter().any(|a| a == "-vf" || a == "-af"));
    }

    #[test]
    fn test_quality_720_scales_and_reencodes() {
        let mut config = ProcessingConfig::default();
        config.quality = Some(serde_json::from_value(serde_json::json!("720p")).expect("profile"));
        let task = task(TaskKind::Video, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out.mp4");

        assert_eq!(plan.len(), 1);
        let args = &plan.steps[0].args;
        let vf = args.iter().position(|a| a == "-vf").expect("-vf present");
        assert!(args[vf + 1].contains("scale=1280:720"));
        assert!(args.iter().any(|a| a == "libx264"));
        assert!(args.iter().any(|a| a == "aac"));
    }

    #[test]
    fn test_split_by_duration_stream_copies_segments() {
        let mut config = ProcessingConfig::default();
        config.split = Some(SplitSpec::Duration { seconds: 90 });
        let task = task(TaskKind::Video, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out_%03d.mp4");

        assert_eq!(plan.len(), 1);
        let args = &plan.steps[0].args;
        let st = args
            .iter()
            .position(|a| a == "-segment_time")
            .expect("-segment_time");
        assert_eq!(args[st + 1], "90");
        assert!(args.iter().any(|a| a == "segment"));
        assert!(plan.steps[0].has_pattern_output());
    }

    #[test]
    fn test_split_by_size_estimates_duration() {
        let mut config = ProcessingConfig::default();
        // Container: 60 MB over 120 s → 30 MB ≈ 60 s segments.
        config.split = Some(SplitSpec::Size { bytes: 30_000_000 });
        let task = task(TaskKind::Video, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out_%03d.mp4");

        let args = &plan.steps[0].args;
        let st = args
            .iter()
            .position(|a| a == "-segment_time")
            .expect("-segment_time");
        assert_eq!(args[st + 1], "60");
    }

    #[test]
    fn test_audio_filters_compose_in_fixed_order() {
        let mut config = ProcessingConfig::default();
        config.audio_filters = Some(AudioFilterSet {
            slowed: true,
            reverb: true,
            eight_d: false,
            volume: Some(1.5),
            bass: Some(4),
            treble: None,
        });
        let task = task(TaskKind::Audio, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out.mp3");

        let args = &plan.steps[0].args;
        let af = args.iter().position(|a| a == "-af").expect("-af present");
        assert_eq!(args[af + 1], "atempo=0.8,aecho=0.8:0.9:40|50:0.4|0.3,volume=1.5,bass=g=4");
        assert!(args.iter().any(|a| a == "-vn"));
        assert!(args.iter().any(|a| a == "libmp3lame"));
    }

    #[test]
    fn test_lossless_audio_omits_bitrate() {
        let mut config = ProcessingConfig::default();
        config.audio_codec = Some(AudioCodec::Flac);
        let task = task(TaskKind::Audio, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out.flac");

        let args = &plan.steps[0].args;
        assert!(args.iter().any(|a| a == "flac"));
        assert!(!args.iter().any(|a| a == "-b:a"));
    }

    #[test]
    fn test_side_audio_mapped_by_input_index() {
        let config = ProcessingConfig::default();
        let task = task(TaskKind::Video, config);
        let input = PathBuf::from("/work/in.mp4");
        let output = PathBuf::from("/work/out.mp4");
        let side = PathBuf::from("/work/track.mp3");
        let plan = planner()
            .plan(&PlanRequest {
                task: &task,
                media: &media_1080p(),
                input: &input,
                output: &output,
                side_audio: Some(&side),
                side_subtitle: None,
                concat_list: None,
            })
            .expect("plan");

        let args = &plan.steps[0].args;
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "1:a:0"));
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "0:v:0"));
    }

    #[test]
    fn test_subtitle_skipped_for_non_text_container() {
        let config = ProcessingConfig::default();
        let task = task(TaskKind::Video, config);
        let input = PathBuf::from("/work/in.webm");
        let output = PathBuf::from("/work/out.webm");
        let subs = PathBuf::from("/work/subs.srt");
        let plan = planner()
            .plan(&PlanRequest {
                task: &task,
                media: &media_1080p(),
                input: &input,
                output: &output,
                side_audio: None,
                side_subtitle: Some(&subs),
                concat_list: None,
            })
            .expect("plan");

        let args = &plan.steps[0].args;
        assert!(!args.iter().any(|a| a.contains(":s:")));
        assert!(!args.iter().any(|a| a == "-c:s"));
    }

    #[test]
    fn test_step_output_round_trip() {
        // The declared output must equal the final argument of the command.
        let mut config = ProcessingConfig::default();
        config.quality = Some(serde_json::from_value(serde_json::json!("480p")).expect("profile"));
        let task = task(TaskKind::Video, config);
        let plan = plan_for(&task, &media_1080p(), "/work/out.mp4");

        for step in &plan.steps {
            assert_eq!(step.args.last().map(String::as_str), step.output.to_str());
        }
    }

    #[test]
    fn test_join_requires_concat_list() {
        let task = task(TaskKind::Join, ProcessingConfig::default());
        let input = PathBuf::from("/work/in.mp4");
        let output = PathBuf::from("/work/out.mp4");
        let err = planner()
            .plan(&PlanRequest {
                task: &task,
                media: &media_1080p(),
                input: &input,
                output: &output,
                side_audio: None,
                side_subtitle: None,
                concat_list: None,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlan { .. }));
    }

    #[test]
    fn test_document_kind_passes_through() {
        let task = task(TaskKind::Document, ProcessingConfig::default());
        let input = PathBuf::from("/work/report.pdf");
        let output = PathBuf::from("/work/out/report.pdf");
        let plan = planner()
            .plan(&PlanRequest {
                task: &task,
                media: &MediaInfo::default(),
                input: &input,
                output: &output,
                side_audio: None,
                side_subtitle: None,
                concat_list: None,
            })
            .expect("plan");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_archive_kind_plans_extraction() {
        let task = task(TaskKind::Archive, ProcessingConfig::default());
        let input = PathBuf::from("/work/bundle.zip");
        let output = PathBuf::from("/work/bundle_extracted");
        let plan = planner()
            .plan(&PlanRequest {
                task: &task,
                media: &MediaInfo::default(),
                input: &input,
                output: &output,
                side_audio: None,
                side_subtitle: None,
                concat_list: None,
            })
            .expect("plan");

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].program, "unzip");
    }

    #[test]
    fn test_output_file_name_decisions() {
        let mut gif_config = ProcessingConfig::default();
        gif_config.gif = Some(GifSpec {
            start: None,
            duration_secs: None,
            fps: None,
        });
        let gif_task = task(TaskKind::Video, gif_config);
        assert_eq!(
            CommandPlanner::output_file_name(&gif_task, &media_1080p()),
            "source.gif"
        );

        let mut hq = ProcessingConfig::default();
        hq.quality = Some(serde_json::from_value(serde_json::json!("720p")).expect("profile"));
        let hq_task = task(TaskKind::Video, hq);
        assert_eq!(
            CommandPlanner::output_file_name(&hq_task, &media_1080p()),
            "source.mp4"
        );

        let audio_task = task(TaskKind::Audio, ProcessingConfig::default());
        assert_eq!(
            CommandPlanner::output_file_name(&audio_task, &media_1080p()),
            "source.mp3"
        );
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("50% off: now"), "50\\% off\\: now");
        assert_eq!(escape_drawtext("it's"), "it\\'s");
    }
}
