//! VLC process controller.
//!
//! Tracks at most one video/image process and one screensaver process.
//! Children are detached: the controller never waits on them and never
//! observes natural exit, so `status()` reports "a start was requested",
//! not "a process is still alive". Killing goes by OS process name and
//! therefore hits every VLC instance on the machine, not just ours.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::Error;

/// Allow-listed commands for `/api/execute`, keyed by logical name and
/// platform. Argument vectors are fixed; callers only pick the name.
const ALLOWED_COMMANDS: &[(&str, &[(&str, &[&str])])] = &[(
    "kill_vlc",
    &[
        ("windows", &["taskkill", "/IM", "vlc.exe", "/F"]),
        ("linux", &["killall", "-s", "9", "vlc"]),
        ("macos", &["killall", "-9", "VLC"]),
    ],
)];

/// Derived playback state reported by `/api/status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlaybackStatus {
    pub video_playing: bool,
    pub screensaver_active: bool,
    pub looping: bool,
}

pub struct PlayerController {
    player_override: Option<PathBuf>,
    playlist_path: PathBuf,
    video: Option<Child>,
    screensaver: Option<Child>,
    looping: bool,
}

impl PlayerController {
    #[must_use]
    pub fn new(player_override: Option<PathBuf>, playlist_path: PathBuf) -> Self {
        Self {
            player_override,
            playlist_path,
            video: None,
            screensaver: None,
            looping: false,
        }
    }

    /// Best-effort kill of every VLC instance by process name. Both slots
    /// and the loop flag are always cleared; failures are logged, never
    /// returned.
    pub async fn kill_all(&mut self) {
        match command_for("kill_vlc", std::env::consts::OS) {
            Ok(argv) => match run_silenced(argv).await {
                Ok(status) if status.success() => info!("killed running player processes"),
                Ok(status) => {
                    debug!(code = ?status.code(), "no player processes to kill");
                }
                Err(err) => warn!(error = %err, "failed to run player kill command"),
            },
            Err(_) => warn!(os = std::env::consts::OS, "no kill command for this platform"),
        }
        self.video = None;
        self.screensaver = None;
        self.looping = false;
    }

    /// Kill everything, then launch fullscreen video playback. The handle
    /// lands in the video slot.
    pub async fn play_video(&mut self, path: &Path, looping: bool) -> Result<(), Error> {
        self.kill_all().await;
        let player = self.resolve_player()?;
        let mut cmd = Command::new(&player);
        cmd.args(["--fullscreen", "--no-video-title-show", "--quiet"]);
        if looping {
            cmd.arg("--loop");
        }
        cmd.arg(path);
        let child = spawn_detached(cmd)?;
        info!(player = %player.display(), path = %path.display(), looping, "video playback started");
        self.video = Some(child);
        self.looping = looping;
        Ok(())
    }

    /// Kill everything, then display a single image indefinitely. Shares
    /// the video slot with video playback.
    pub async fn show_image(&mut self, path: &Path) -> Result<(), Error> {
        self.kill_all().await;
        let player = self.resolve_player()?;
        let mut cmd = Command::new(&player);
        cmd.args([
            "--fullscreen",
            "--no-video-title-show",
            "--image-duration",
            "-1",
            "--no-repeat",
            "--quiet",
        ]);
        cmd.arg(path);
        let child = spawn_detached(cmd)?;
        info!(player = %player.display(), path = %path.display(), "image display started");
        self.video = Some(child);
        Ok(())
    }

    /// Launch a looping slideshow over `images`. Writes the playlist
    /// artifact (overwriting any previous one) and stores the handle in
    /// the screensaver slot. Does not kill a running video; callers issue
    /// an explicit `kill_all` first if they want that.
    pub async fn start_slideshow(
        &mut self,
        images: &[PathBuf],
        duration_secs: u32,
    ) -> Result<(), Error> {
        if images.is_empty() {
            return Err(Error::Validation(
                "No images found for screensaver".into(),
            ));
        }
        let mut playlist = String::new();
        for image in images {
            playlist.push_str(&image.to_string_lossy());
            playlist.push('\n');
        }
        fs::write(&self.playlist_path, playlist)?;

        let player = self.resolve_player()?;
        let mut cmd = Command::new(&player);
        cmd.args(["--fullscreen", "--image-duration"])
            .arg(duration_secs.to_string())
            .args(["--loop", "--no-video-title-show"])
            .arg(&self.playlist_path);
        let child = spawn_detached(cmd)?;
        info!(
            count = images.len(),
            playlist = %self.playlist_path.display(),
            "screensaver slideshow started"
        );
        self.screensaver = Some(child);
        Ok(())
    }

    /// Execute one of the fixed allow-listed commands. The exit status is
    /// not checked, matching the fire-and-forget kill semantics; only a
    /// failed spawn is an error.
    pub async fn run_allowed_command(&self, name: &str) -> Result<(), Error> {
        let argv = command_for(name, std::env::consts::OS)?;
        info!(command = name, argv = ?argv, "executing allow-listed command");
        run_silenced(argv).await?;
        Ok(())
    }

    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            video_playing: self.video.is_some(),
            screensaver_active: self.screensaver.is_some(),
            looping: self.looping,
        }
    }

    fn resolve_player(&self) -> Result<PathBuf, Error> {
        if let Some(cmd) = &self.player_override {
            return Ok(cmd.clone());
        }
        if cfg!(target_os = "windows") {
            return windows_install_paths()
                .into_iter()
                .find(|p| p.exists())
                .ok_or(Error::PlayerNotFound);
        }
        // Elsewhere the bare command resolves via the search path.
        Ok(PathBuf::from("vlc"))
    }
}

/// Fixed VLC install locations probed on Windows.
fn windows_install_paths() -> Vec<PathBuf> {
    let mut out = vec![
        PathBuf::from(r"C:\Program Files\VideoLAN\VLC\vlc.exe"),
        PathBuf::from(r"C:\Program Files (x86)\VideoLAN\VLC\vlc.exe"),
    ];
    for var in ["ProgramFiles", "ProgramFiles(x86)"] {
        if let Ok(base) = std::env::var(var) {
            out.push(PathBuf::from(base).join("VideoLAN").join("VLC").join("vlc.exe"));
        }
    }
    out
}

/// Look up the argv for an allow-listed command on the given platform.
fn command_for(name: &str, os: &str) -> Result<&'static [&'static str], Error> {
    let (_, variants) = ALLOWED_COMMANDS
        .iter()
        .find(|(cmd, _)| *cmd == name)
        .ok_or_else(|| Error::CommandNotAllowed(name.to_string()))?;
    variants
        .iter()
        .find(|(platform, _)| *platform == os)
        .map(|(_, argv)| *argv)
        .ok_or_else(|| Error::UnsupportedPlatform {
            command: name.to_string(),
            platform: os.to_string(),
        })
}

async fn run_silenced(argv: &[&str]) -> std::io::Result<std::process::ExitStatus> {
    Command::new(argv[0])
        .args(&argv[1..])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
}

fn spawn_detached(mut cmd: Command) -> Result<Child, Error> {
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    cmd.spawn().map_err(Error::Launch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn allow_list_rejects_unknown_names() {
        let err = command_for("rm_rf", "linux").unwrap_err();
        assert!(matches!(err, Error::CommandNotAllowed(_)));
    }

    #[test]
    fn allow_list_rejects_uncovered_platforms() {
        let err = command_for("kill_vlc", "plan9").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
    }

    #[test]
    fn allow_list_covers_the_three_platforms() {
        for os in ["windows", "linux", "macos"] {
            assert!(command_for("kill_vlc", os).is_ok());
        }
    }

    #[tokio::test]
    async fn kill_all_clears_both_slots_and_loop_flag() {
        let tmp = tempdir().unwrap();
        let mut player = PlayerController::new(None, tmp.path().join("slideshow.m3u"));
        player.looping = true;
        player.kill_all().await;
        let status = player.status();
        assert!(!status.video_playing);
        assert!(!status.screensaver_active);
        assert!(!status.looping);
    }

    #[tokio::test]
    async fn empty_slideshow_is_rejected_without_spawning() {
        let tmp = tempdir().unwrap();
        let playlist = tmp.path().join("slideshow.m3u");
        let mut player = PlayerController::new(None, playlist.clone());
        let err = player.start_slideshow(&[], 5).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!playlist.exists());
        assert!(!player.status().screensaver_active);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sequential_video_starts_keep_one_handle() {
        let tmp = tempdir().unwrap();
        let mut player = PlayerController::new(
            Some(PathBuf::from("/bin/true")),
            tmp.path().join("slideshow.m3u"),
        );
        player.play_video(Path::new("/tmp/a.mp4"), true).await.unwrap();
        assert!(player.status().video_playing);
        assert!(player.status().looping);

        player.play_video(Path::new("/tmp/b.mp4"), false).await.unwrap();
        let status = player.status();
        assert!(status.video_playing);
        assert!(!status.looping);
        assert!(!status.screensaver_active);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slideshow_writes_playlist_one_path_per_line() {
        let tmp = tempdir().unwrap();
        let playlist = tmp.path().join("slideshow.m3u");
        let mut player =
            PlayerController::new(Some(PathBuf::from("/bin/true")), playlist.clone());
        let images = vec![PathBuf::from("/img/a.jpg"), PathBuf::from("/img/b.png")];
        player.start_slideshow(&images, 7).await.unwrap();

        let written = fs::read_to_string(&playlist).unwrap();
        assert_eq!(written, "/img/a.jpg\n/img/b.png\n");
        assert!(player.status().screensaver_active);
        assert!(!player.status().video_playing);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn image_display_shares_the_video_slot() {
        let tmp = tempdir().unwrap();
        let mut player = PlayerController::new(
            Some(PathBuf::from("/bin/true")),
            tmp.path().join("slideshow.m3u"),
        );
        player.show_image(Path::new("/img/a.jpg")).await.unwrap();
        let status = player.status();
        assert!(status.video_playing);
        assert!(!status.screensaver_active);
        assert!(!status.looping);
    }
}
