use anyhow::{Context, Result};
use std::path::Path;

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("無法建立資料夾: {}", path.display()))?;
    }
    Ok(())
}

/// 解析串流來源
///
/// 若 `data_root` 底下存在同名的本地檔案則優先使用，否則原樣視為遠端 URL
#[must_use]
pub fn resolve_source_location(data_root: &Path, reference: &str) -> String {
    let local = data_root.join(reference);
    if local.exists() {
        local.to_string_lossy().to_string()
    } else {
        reference.to_string()
    }
}
