//! Shader gallery registry.

use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::{ShaderDescriptor, ShaderDialect};
use crate::error::Result;

/// Built-in shaders: (name, dialect, source)
const BUILTINS: &[(&str, ShaderDialect, &str)] = &[
    ("Plasma", ShaderDialect::Raw, include_str!("builtin/plasma.frag")),
    ("Tunnel", ShaderDialect::ShaderToy, include_str!("builtin/tunnel.frag")),
    ("Rings", ShaderDialect::Raw, include_str!("builtin/rings.frag")),
    ("Kaleidoscope", ShaderDialect::ShaderToy, include_str!("builtin/kaleidoscope.frag")),
    ("Oscilloscope", ShaderDialect::Raw, include_str!("builtin/oscilloscope.frag")),
    ("Starfield", ShaderDialect::ShaderToy, include_str!("builtin/starfield.frag")),
];

/// Ordered list of shaders with a current selection
pub struct ShaderGallery {
    shaders: Vec<ShaderDescriptor>,
    current: usize,
}

impl ShaderGallery {
    /// Empty gallery (custom shaders only)
    pub fn new() -> Self {
        Self {
            shaders: Vec::new(),
            current: 0,
        }
    }

    /// Gallery populated with the built-in shaders
    pub fn with_builtins() -> Self {
        let mut gallery = Self::new();
        for &(name, dialect, source) in BUILTINS {
            gallery.shaders.push(ShaderDescriptor::new(name, dialect, source));
        }
        gallery
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&ShaderDescriptor> {
        self.shaders.get(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&ShaderDescriptor> {
        self.shaders.get(index)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shaders.iter().map(|s| s.name.as_str())
    }

    /// Select by index; out-of-range indices are ignored
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.shaders.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    /// Advance to the next shader (wraps)
    pub fn next(&mut self) -> usize {
        if !self.shaders.is_empty() {
            self.current = (self.current + 1) % self.shaders.len();
        }
        self.current
    }

    /// Go back to the previous shader (wraps)
    pub fn previous(&mut self) -> usize {
        if !self.shaders.is_empty() {
            self.current = (self.current + self.shaders.len() - 1) % self.shaders.len();
        }
        self.current
    }

    /// Index of a shader by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.shaders
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Append a user shader; a clashing name gets a numeric suffix
    pub fn push_custom(&mut self, mut descriptor: ShaderDescriptor) -> usize {
        if self.find(&descriptor.name).is_some() {
            let base = descriptor.name.clone();
            let mut n = 2;
            while self.find(&format!("{} ({})", base, n)).is_some() {
                n += 1;
            }
            descriptor.name = format!("{} ({})", base, n);
        }
        info!("Added shader '{}' ({:?})", descriptor.name, descriptor.dialect);
        self.shaders.push(descriptor);
        self.shaders.len() - 1
    }

    /// Append every `.frag`/`.glsl` file in `dir` (sorted by file name).
    ///
    /// Returns the number of shaders added. Unreadable files are skipped.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("frag") || ext.eq_ignore_ascii_case("glsl"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut added = 0;
        for path in paths {
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    warn!("Skipping shader {:?}: {}", path, e);
                    continue;
                }
            };
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("custom")
                .to_string();
            let dialect = ShaderDialect::infer(&source);
            self.push_custom(ShaderDescriptor::new(&name, dialect, &source));
            added += 1;
        }
        Ok(added)
    }
}

impl Default for ShaderGallery {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtins_cover_both_dialects() {
        let gallery = ShaderGallery::with_builtins();
        assert_eq!(gallery.len(), BUILTINS.len());
        assert!(gallery.shaders.iter().any(|s| s.dialect == ShaderDialect::Raw));
        assert!(gallery.shaders.iter().any(|s| s.dialect == ShaderDialect::ShaderToy));
        // Declared dialect agrees with the source
        for shader in &gallery.shaders {
            assert_eq!(ShaderDialect::infer(&shader.source), shader.dialect, "{}", shader.name);
        }
    }

    #[test]
    fn test_navigation_wraps() {
        let mut gallery = ShaderGallery::with_builtins();
        assert_eq!(gallery.current_index(), 0);
        assert_eq!(gallery.previous(), gallery.len() - 1);
        assert_eq!(gallery.next(), 0);
        assert_eq!(gallery.next(), 1);
    }

    #[test]
    fn test_select_out_of_range_is_ignored() {
        let mut gallery = ShaderGallery::with_builtins();
        assert!(gallery.select(2));
        assert!(!gallery.select(100));
        assert_eq!(gallery.current_index(), 2);
    }

    #[test]
    fn test_empty_gallery_navigation() {
        let mut gallery = ShaderGallery::new();
        assert_eq!(gallery.next(), 0);
        assert_eq!(gallery.previous(), 0);
        assert!(gallery.current().is_none());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let gallery = ShaderGallery::with_builtins();
        assert_eq!(gallery.find("tunnel"), Some(1));
        assert_eq!(gallery.find(" PLASMA "), Some(0));
        assert_eq!(gallery.find("nope"), None);
    }

    #[test]
    fn test_push_custom_dedupes_names() {
        let mut gallery = ShaderGallery::with_builtins();
        let src = "void main() { fragColor = vec4(1.0); }";
        let a = gallery.push_custom(ShaderDescriptor::new("Plasma", ShaderDialect::Raw, src));
        let b = gallery.push_custom(ShaderDescriptor::new("Plasma", ShaderDialect::Raw, src));
        assert_eq!(gallery.get(a).unwrap().name, "Plasma (2)");
        assert_eq!(gallery.get(b).unwrap().name, "Plasma (3)");
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut toy = std::fs::File::create(dir.path().join("waves.frag")).unwrap();
        writeln!(toy, "void mainImage(out vec4 fragColor, in vec2 fragCoord) {{ fragColor = vec4(0.0); }}").unwrap();
        let mut raw = std::fs::File::create(dir.path().join("flat.glsl")).unwrap();
        writeln!(raw, "void main() {{ fragColor = vec4(1.0); }}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut gallery = ShaderGallery::new();
        assert_eq!(gallery.load_dir(dir.path()).unwrap(), 2);
        let flat = gallery.find("flat").unwrap();
        let waves = gallery.find("waves").unwrap();
        assert_eq!(gallery.get(flat).unwrap().dialect, ShaderDialect::Raw);
        assert_eq!(gallery.get(waves).unwrap().dialect, ShaderDialect::ShaderToy);
    }

    #[test]
    fn test_load_missing_dir_is_error() {
        let mut gallery = ShaderGallery::new();
        assert!(gallery.load_dir(Path::new("/definitely/not/here")).is_err());
    }
}
