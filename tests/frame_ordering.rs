use hair_sim::frame::{FrameError, FrameOrchestrator, FramePhase, RecordingQueue, Semaphore};

fn run_frame(orchestrator: &mut FrameOrchestrator, queue: &mut RecordingQueue) -> Result<(), FrameError> {
    orchestrator.acquire_image()?;
    if !orchestrator.is_paused() {
        orchestrator.submit_simulation(queue, ())?;
    }
    orchestrator.submit_render(queue, ())?;
    orchestrator.present()
}

fn primed() -> (FrameOrchestrator, RecordingQueue) {
    let mut queue = RecordingQueue::new();
    let mut orchestrator = FrameOrchestrator::new(false);
    orchestrator.prime(&mut queue).unwrap();
    (orchestrator, queue)
}

#[test]
fn test_simulation_follows_previous_render() {
    let (mut orchestrator, mut queue) = primed();
    for _ in 0..5 {
        run_frame(&mut orchestrator, &mut queue).unwrap();
    }

    assert_eq!(orchestrator.frame_index(), 5);
    for (i, submission) in queue.submissions.iter().enumerate() {
        match submission.label {
            "simulate" => {
                let signal = queue.last_signal_before(i, Semaphore::GraphicsDone).unwrap();
                let source = &queue.submissions[signal];
                if submission.frame == 0 {
                    assert_eq!(source.label, "prime");
                } else {
                    assert_eq!(source.label, "render");
                    assert_eq!(source.frame + 1, submission.frame, "simulate must wait on the previous frame's render");
                }
            }
            "render" => {
                let signal = queue.last_signal_before(i, Semaphore::ComputeDone).unwrap();
                let source = &queue.submissions[signal];
                assert_eq!(source.label, "simulate");
                assert_eq!(source.frame, submission.frame);
            }
            _ => {}
        }
    }
}

#[test]
fn test_resume_after_pause_waits_on_last_unpaused_render() {
    let (mut orchestrator, mut queue) = primed();
    run_frame(&mut orchestrator, &mut queue).unwrap();

    orchestrator.set_paused(true);
    for _ in 0..3 {
        run_frame(&mut orchestrator, &mut queue).unwrap();
    }
    orchestrator.set_paused(false);
    run_frame(&mut orchestrator, &mut queue).unwrap();

    assert_eq!(
        queue.labels(),
        vec!["prime", "simulate", "render", "render", "render", "render", "simulate", "render"]
    );

    let resumed = queue.submissions.iter().rposition(|s| s.label == "simulate").unwrap();
    let signal = queue.last_signal_before(resumed, Semaphore::GraphicsDone).unwrap();
    assert_eq!(queue.submissions[signal].frame, 0, "paused renders signal nothing");
    assert_eq!(queue.submissions[resumed].frame, 4);
}

#[test]
fn test_prime_is_idempotent() {
    let (mut orchestrator, mut queue) = primed();
    orchestrator.prime(&mut queue).unwrap();
    assert_eq!(queue.labels(), vec!["prime"]);
    assert_eq!(orchestrator.ledger().pending(), vec![Semaphore::GraphicsDone]);
}

#[test]
fn test_present_without_render_is_rejected() {
    let (mut orchestrator, _queue) = primed();
    orchestrator.acquire_image().unwrap();
    assert!(matches!(
        orchestrator.present(),
        Err(FrameError::OutOfOrder {
            expected: FramePhase::Rendered,
            found: FramePhase::Acquired
        })
    ));
}

#[test]
fn test_double_acquire_is_rejected() {
    let (mut orchestrator, _queue) = primed();
    orchestrator.acquire_image().unwrap();
    assert!(orchestrator.acquire_image().is_err());
    assert_eq!(orchestrator.phase(), FramePhase::Acquired);
}
