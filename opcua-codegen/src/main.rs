// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Reads `dictionary/types.yaml` and writes one `.rs` file per module into
//! `opcua-types/src/generated/`. Not invoked by the normal build — the
//! output is checked in, the same way the teacher's own codegen output is;
//! this tool exists for contributors adding or editing a wire type.

mod codegen;
mod dictionary;
mod error;

use std::fs;
use std::path::{Path, PathBuf};

use convert_case::{Case, Casing};

use dictionary::Dictionary;
use error::CodeGenError;

fn main() -> Result<(), CodeGenError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(dictionary_path), Some(out_dir)) = (args.next(), args.next()) else {
        println!(
            "Usage:\n  opcua-codegen <dictionary.yaml> <output-dir>\n\n\
             Example:\n  opcua-codegen opcua-codegen/dictionary/types.yaml opcua-types/src/generated\n"
        );
        return Ok(());
    };

    run(&dictionary_path, &out_dir)
}

fn run(dictionary_path: &str, out_dir: &str) -> Result<(), CodeGenError> {
    let text = fs::read_to_string(dictionary_path).map_err(|source| CodeGenError::Io {
        path: dictionary_path.to_string(),
        source,
    })?;
    let dictionary: Dictionary = serde_yaml::from_str(&text)?;

    let out_dir = Path::new(out_dir);
    for module in &dictionary.modules {
        let rendered = codegen::render_module(module)?;
        let path = out_file_path(out_dir, &module.name);
        fs::write(&path, rendered).map_err(|source| CodeGenError::Write {
            module: module.name.clone(),
            path: path.display().to_string(),
            source,
        })?;
        log::info!("wrote {}", path.display());
    }

    Ok(())
}

fn out_file_path(out_dir: &Path, module_name: &str) -> PathBuf {
    out_dir.join(format!("{}.rs", module_name.to_case(Case::Snake)))
}
