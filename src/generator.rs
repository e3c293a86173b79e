//! Code generator entry point.
//!
//! [`CodeGenerator`] ties the pipeline together: configure it with the
//! registered type lists, point it at declaration sources, and it produces
//! one codec unit per source plus the shared common unit.
//!
//! ```no_run
//! use ffi_json_codegen::CodeGenerator;
//!
//! let mut generator = CodeGenerator::new();
//! generator
//!     .register_struct("SamplerDesc")
//!     .register_enum("FILTER_TYPE");
//! generator.write_dir("declarations", "generated").unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::config::{ClassifierMode, GeneratorConfig};
use crate::emit::{emit_common, emit_unit};
use crate::errors::GenResult;
use crate::extractor::extract;
use crate::types::FieldDescriptor;

#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    config: GeneratorConfig,
    header: Option<String>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::new(),
            header: None,
        }
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            header: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GeneratorConfig {
        &mut self.config
    }

    /// Set a custom header comment for generated units.
    pub fn set_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.header = Some(header.into());
        self
    }

    pub fn register_struct(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.register_struct(name);
        self
    }

    pub fn register_enum(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.register_enum(name);
        self
    }

    pub fn register_base(
        &mut self,
        name: impl Into<String>,
        injected: FieldDescriptor,
    ) -> &mut Self {
        self.config.register_base(name, injected);
        self
    }

    pub fn allow_extra_key(
        &mut self,
        type_name: impl Into<String>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.config.allow_extra_key(type_name, key);
        self
    }

    pub fn set_mode(&mut self, mode: ClassifierMode) -> &mut Self {
        self.config.mode = mode;
        self
    }

    pub fn set_strict_keys(&mut self, strict: bool) -> &mut Self {
        self.config.strict_keys = strict;
        self
    }

    /// Generate the codec unit for one in-memory declaration source.
    ///
    /// `module` is the name of the declaration module the generated unit
    /// imports its types from.
    pub fn generate_str(&self, module: &str, source: &str) -> GenResult<String> {
        let registry = extract(source, &self.config)?;
        debug!(
            "generating codec unit for module '{module}' ({} structs, {} enums)",
            registry.structs().count(),
            registry.enums().count()
        );
        emit_unit(module, &registry, &self.config, self.header.as_deref())
    }

    /// Generate the codec unit for a declaration file.
    pub fn generate_file(&self, path: impl AsRef<Path>) -> GenResult<String> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        self.generate_str(&module_name(path), &source)
    }

    /// Generate the shared common unit.
    pub fn generate_common(&self) -> String {
        emit_common(self.header.as_deref())
    }

    /// Output file name for a declaration file: `<stem>_codec.rs`.
    pub fn generate_filename(path: impl AsRef<Path>) -> String {
        format!("{}_codec.rs", module_name(path.as_ref()))
    }

    /// Generate and write the codec unit for `input` into `out_dir`.
    pub fn write_file(
        &self,
        input: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> GenResult<PathBuf> {
        let input = input.as_ref();
        let code = self.generate_file(input)?;
        let out_path = out_dir.as_ref().join(Self::generate_filename(input));
        fs::write(&out_path, code)?;
        debug!("wrote {}", out_path.display());
        Ok(out_path)
    }

    /// Write the shared common unit into `out_dir`.
    pub fn write_common(&self, out_dir: impl AsRef<Path>) -> GenResult<PathBuf> {
        let out_path = out_dir.as_ref().join("common_codec.rs");
        fs::write(&out_path, self.generate_common())?;
        Ok(out_path)
    }

    /// Generate codec units for every `.rs` file under `in_dir`, plus the
    /// common unit. Files are visited in path order.
    pub fn write_dir(
        &self,
        in_dir: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> GenResult<Vec<PathBuf>> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir)?;
        let mut written = vec![self.write_common(out_dir)?];
        for entry in WalkDir::new(in_dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().map_or(true, |ext| ext != "rs") {
                continue;
            }
            written.push(self.write_file(entry.path(), out_dir)?);
        }
        Ok(written)
    }
}

fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "declarations".to_string())
}
