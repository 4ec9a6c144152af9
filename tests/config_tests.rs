use media_kiosk::config::Config;
use std::path::PathBuf;

#[test]
fn parse_empty_config_uses_defaults() {
    let cfg: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.video_directory, PathBuf::from("videos"));
    assert_eq!(cfg.image_directory, PathBuf::from("images"));
    assert_eq!(cfg.bind_address, "0.0.0.0");
    assert_eq!(cfg.port, 5000);
    assert_eq!(cfg.image_duration_secs, 5);
    assert!(cfg.player_command.is_none());
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
video-directory: "/data/videos"
image-directory: "/data/images"
bind-address: "127.0.0.1"
port: 8080
image-duration-secs: 10
player-command: "/usr/bin/cvlc"
"#;
    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.video_directory, PathBuf::from("/data/videos"));
    assert_eq!(cfg.image_directory, PathBuf::from("/data/images"));
    assert_eq!(cfg.bind_address, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.image_duration_secs, 10);
    assert_eq!(cfg.player_command, Some(PathBuf::from("/usr/bin/cvlc")));
}

#[test]
fn absolutized_resolves_relative_directories() {
    let cfg: Config = serde_yaml::from_str("{}").unwrap();
    let cfg = cfg.absolutized();
    assert!(cfg.video_directory.is_absolute());
    assert!(cfg.image_directory.is_absolute());
    assert!(cfg.playlist_path.is_absolute());
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(cfg.video_directory, cwd.join("videos"));
}

#[test]
fn load_reports_missing_file_with_path() {
    let err = Config::load(std::path::Path::new("/nonexistent/kiosk.yaml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/kiosk.yaml"));
}
