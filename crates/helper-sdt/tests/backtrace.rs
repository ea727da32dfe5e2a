//! Backtrace decomposition into frame firings.

use std::sync::Arc;
use std::thread;

use helper_sdt::{
    BacktraceEmitter, CaptureError, EntryPoint, Firing, FixedCapture, ProbeArg, ProbeSurface,
    RecordingBinding, RuleName,
};

fn recording_surface() -> (Arc<RecordingBinding>, ProbeSurface) {
    let binding = Arc::new(RecordingBinding::new());
    let surface = ProbeSurface::with_binding(binding.clone());
    (binding, surface)
}

fn frame(firing: &Firing) -> (&str, u64) {
    assert_eq!(firing.entry, EntryPoint::Frame);
    match firing.args.as_slice() {
        [ProbeArg::Str(line), ProbeArg::UInt(ordinal)] => (line.as_ref(), *ordinal),
        other => panic!("unexpected frame args: {other:?}"),
    }
}

#[test]
fn test_three_frames_in_order_without_retire() {
    let (binding, surface) = recording_surface();
    let emitter = BacktraceEmitter::with_capture(
        surface,
        FixedCapture::from_lines(["frame0", "frame1", "frame2"]),
    );

    let count = emitter.emit(&RuleName::from("R1")).unwrap();
    assert_eq!(count, 3);

    let firings = binding.take();
    assert_eq!(firings.len(), 3);
    for (ordinal, firing) in firings.iter().enumerate() {
        assert_eq!(firing.rule, "R1");
        let (line, got) = frame(firing);
        assert_eq!(line, format!("frame{ordinal}"));
        assert_eq!(got, ordinal as u64);
    }
    assert!(firings.iter().all(|f| f.entry != EntryPoint::Retire));
}

#[test]
fn test_empty_capture_fires_nothing() {
    let (binding, surface) = recording_surface();
    let emitter = BacktraceEmitter::with_capture(surface, FixedCapture::new(""));

    assert_eq!(emitter.emit(&RuleName::from("empty")).unwrap(), 0);
    assert!(binding.is_empty());
}

#[test]
fn test_capture_failure_is_an_error() {
    let (binding, surface) = recording_surface();
    let disabled = || -> Result<String, CaptureError> { Err(CaptureError::Disabled) };
    let emitter = BacktraceEmitter::with_capture(surface, disabled);

    assert_eq!(
        emitter.emit(&RuleName::from("fail")),
        Err(CaptureError::Disabled)
    );
    assert!(binding.is_empty());
}

#[test]
fn test_live_capture_matches_rendered_lines() {
    let (binding, surface) = recording_surface();

    let count = surface.emit_backtrace(&RuleName::from("live")).unwrap();
    assert!(count > 0);

    let firings = binding.take();
    assert_eq!(firings.len(), count);
    for (ordinal, firing) in firings.iter().enumerate() {
        assert_eq!(frame(firing).1, ordinal as u64);
    }
}

/// The stack is reported as captured, capturing call included.
#[test]
fn test_top_frame_is_the_capture_itself() {
    let (binding, surface) = recording_surface();
    surface.emit_backtrace(&RuleName::from("top")).unwrap();

    let firings = binding.take();
    let lines: Vec<&str> = firings.iter().map(|f| frame(f).0).collect();
    assert!(
        lines[0].contains("StdCapture") || lines[0].contains("capture"),
        "top frame: {}",
        lines[0]
    );

    let position = |needle: &str| {
        lines
            .iter()
            .position(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("no frame mentions {needle}:\n{}", lines.join("\n")))
    };
    let emit = position("BacktraceEmitter");
    let caller = position("test_top_frame_is_the_capture_itself");
    assert!(lines[emit].contains("emit"), "{}", lines[emit]);
    assert!(emit < caller, "emit at {emit}, caller at {caller}");
}

#[test]
fn test_same_call_site_same_depth() {
    let (binding, surface) = recording_surface();
    let rule = RuleName::from("repeat");

    let mut counts = Vec::new();
    for _ in 0..2 {
        counts.push(surface.emit_backtrace(&rule).unwrap());
    }

    assert_eq!(counts[0], counts[1]);
    assert_eq!(binding.len(), counts[0] * 2);
}

#[test]
fn test_concurrent_emitters_keep_their_own_order() {
    let (binding, surface) = recording_surface();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let surface = surface.clone();
            thread::spawn(move || {
                let rule = RuleName::from(format!("thread.{i}"));
                surface.emit_backtrace(&rule).unwrap()
            })
        })
        .collect();
    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for (i, count) in counts.into_iter().enumerate() {
        let firings = binding.firings_for(&format!("thread.{i}"));
        assert_eq!(firings.len(), count);
        for (ordinal, firing) in firings.iter().enumerate() {
            assert_eq!(frame(firing).1, ordinal as u64);
        }
    }
}
