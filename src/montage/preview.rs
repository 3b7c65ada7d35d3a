// SYNOID Montage Preview
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Real-time preview: narration through `ffplay -nodisp`, clips through one
// `ffplay` window per entry, switched by the sequencer's tokio timers.

use crate::montage::planner::{Plan, PlanEntry};
use crate::montage::sequencer::{AudioHandle, AudioOutput, Sequencer, SequencerError, VideoSurface};
use crate::montage::timer::{TimerId, TokioTimer};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EXIT_POLL: Duration = Duration::from_millis(50);

struct Narration {
    handle: AudioHandle,
    child: Arc<Mutex<Child>>,
    waiter: JoinHandle<()>,
}

impl Narration {
    /// Kill the player before returning; the waiter only reports natural exits.
    fn release(self) {
        self.waiter.abort();
        if let Ok(mut child) = self.child.lock() {
            if let Err(e) = child.start_kill() {
                debug!("[PREVIEW] Narration process already gone: {}", e);
            }
        }
    }
}

/// Plays the narration file once. Natural exits are reported on the channel.
pub struct FfplayAudio {
    path: PathBuf,
    program: String,
    args: Vec<OsString>,
    next: u64,
    active: Option<Narration>,
    ended_tx: mpsc::UnboundedSender<AudioHandle>,
}

impl FfplayAudio {
    pub fn new(path: &Path, ended_tx: mpsc::UnboundedSender<AudioHandle>) -> Self {
        let mut args: Vec<OsString> = ["-nodisp", "-autoexit", "-loglevel", "error"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(path.as_os_str().to_os_string());
        Self::with_command(path, "ffplay", args, ended_tx)
    }

    fn with_command(
        path: &Path,
        program: &str,
        args: Vec<OsString>,
        ended_tx: mpsc::UnboundedSender<AudioHandle>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            program: program.to_string(),
            args,
            next: 0,
            active: None,
            ended_tx,
        }
    }
}

impl AudioOutput for FfplayAudio {
    fn is_ready(&self) -> bool {
        self.path.exists()
    }

    fn play(&mut self) -> Result<AudioHandle, SequencerError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SequencerError::Audio(format!("{}: {}", self.program, e)))?;

        let handle = AudioHandle(self.next);
        self.next += 1;

        let child = Arc::new(Mutex::new(child));
        let watched = Arc::clone(&child);
        let tx = self.ended_tx.clone();
        let waiter = tokio::spawn(async move {
            loop {
                tokio::time::sleep(EXIT_POLL).await;
                let status = match watched.lock() {
                    Ok(mut child) => child.try_wait(),
                    Err(_) => return,
                };
                match status {
                    Ok(Some(_)) => {
                        let _ = tx.send(handle);
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("[PREVIEW] Narration process lost: {}", e);
                        return;
                    }
                }
            }
        });

        let narration = Narration { handle, child, waiter };
        if let Some(old) = self.active.replace(narration) {
            old.release();
        }
        Ok(handle)
    }

    fn stop(&mut self, handle: AudioHandle) {
        if matches!(&self.active, Some(n) if n.handle == handle) {
            if let Some(narration) = self.active.take() {
                narration.release();
            }
        }
    }
}

impl Drop for FfplayAudio {
    fn drop(&mut self) {
        if let Some(narration) = self.active.take() {
            narration.release();
        }
    }
}

/// A video window showing one plan entry at a time.
#[derive(Default)]
pub struct FfplaySurface {
    child: Option<Child>,
}

impl FfplaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn kill_current(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }
}

impl VideoSurface for FfplaySurface {
    fn show(&mut self, entry: &PlanEntry) -> std::io::Result<()> {
        self.kill_current();
        let child = Command::new("ffplay")
            .args(["-an", "-autoexit", "-loglevel", "error"])
            .arg("-ss")
            .arg(format!("{:.3}", entry.start_offset))
            .arg("-t")
            .arg(format!("{:.3}", entry.play_duration))
            .arg("-window_title")
            .arg(&entry.clip.name)
            .arg(&entry.clip.source)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        self.child = Some(child);
        Ok(())
    }

    fn clear(&mut self) {
        self.kill_current();
    }
}

pub type PreviewSequencer = Sequencer<TokioTimer, FfplayAudio, FfplaySurface>;

/// Play `plan` against the narration at `audio_path` until the session ends
/// or Ctrl+C is pressed.
pub async fn run_preview(plan: Plan, audio_path: &Path) -> Result<()> {
    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel::<TimerId>();
    let (audio_tx, mut audio_rx) = mpsc::unbounded_channel::<AudioHandle>();

    let mut sequencer: PreviewSequencer = Sequencer::new(
        TokioTimer::new(timer_tx),
        FfplayAudio::new(audio_path, audio_tx),
        FfplaySurface::new(),
    );
    sequencer.set_plan(plan);
    sequencer
        .start()
        .context("Failed to start montage preview")?;

    info!("[PREVIEW] Playing. Press Ctrl+C to stop.");

    while sequencer.is_playing() {
        tokio::select! {
            Some(id) = timer_rx.recv() => sequencer.timer_fired(id),
            Some(handle) = audio_rx.recv() => sequencer.audio_finished(handle),
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("[PREVIEW] Ctrl+C handler failed: {}", e);
                }
                sequencer.stop();
            }
        }
    }

    info!("[PREVIEW] Preview finished.");
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn audio_running(program: &str, args: &[&str]) -> (FfplayAudio, mpsc::UnboundedReceiver<AudioHandle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let args = args.iter().map(OsString::from).collect();
        (FfplayAudio::with_command(Path::new("/"), program, args, tx), rx)
    }

    #[tokio::test]
    async fn test_stop_kills_player_before_returning() {
        let (mut audio, mut rx) = audio_running("sleep", &["30"]);
        let handle = audio.play().unwrap();
        let child = Arc::clone(&audio.active.as_ref().unwrap().child);

        audio.stop(handle);
        assert!(audio.active.is_none());

        let mut exited = false;
        for _ in 0..40 {
            if child.lock().unwrap().try_wait().unwrap().is_some() {
                exited = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(exited);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_natural_exit_is_reported() {
        let (mut audio, mut rx) = audio_running("true", &[]);
        let handle = audio.play().unwrap();

        let ended = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(ended, Some(handle));
    }

    #[tokio::test]
    async fn test_stale_stop_keeps_current_player() {
        let (mut audio, _rx) = audio_running("sleep", &["30"]);
        let first = audio.play().unwrap();
        let second = audio.play().unwrap();

        audio.stop(first);
        assert_eq!(audio.active.as_ref().map(|n| n.handle), Some(second));
        audio.stop(second);
        assert!(audio.active.is_none());
    }
}
