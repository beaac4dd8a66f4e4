pub mod settings;

use settings::Settings;
use std::path::Path;

/// 入力ディレクトリから settings.yaml を自動検出して読み込む。
///
/// `<dir>/settings.yaml` が存在すれば読み込んで検証し、
/// 存在しなければデフォルト設定を返す。
pub fn load_settings_for_dir(dir: &Path) -> crate::error::Result<Settings> {
    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}
