// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::io;
use std::path::{Path, PathBuf};

/// 创建目录（已存在时不报错），返回创建的路径
pub async fn create_folder(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&path).await?;
    Ok(path)
}

/// 将任意字符串转换为安全的文件名片段
pub fn sanitize_file_component(raw: &str) -> String {
    let stripped = raw
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let mut out: String = stripped
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}
