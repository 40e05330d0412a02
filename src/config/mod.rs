pub mod job;
pub mod merged;
pub mod settings;

use std::path::Path;

use settings::Settings;

/// File name looked up next to each job file.
pub const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// ジョブファイルと同じディレクトリの `settings.yaml` を読み込む。
/// 無ければ [`Settings::default`] を使う。
pub fn load_settings_for_job(job_file_path: &Path) -> crate::error::Result<Settings> {
    let Some(dir) = job_file_path.parent() else {
        return Err(crate::error::StampError::config(format!(
            "{}: job file has no parent directory",
            job_file_path.display()
        )));
    };

    match dir.join(SETTINGS_FILE_NAME) {
        path if path.is_file() => Settings::from_file(&path),
        _ => Ok(Settings::default()),
    }
}
