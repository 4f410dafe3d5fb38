//! Fragment shader gallery.
//!
//! Shaders come in two GLSL dialects and are wrapped with a shared header
//! (uniforms, helpers) before compilation. Compiled pipelines live in the
//! render system and are created lazily when a shader is first shown.

mod gallery;
mod template;

pub use gallery::ShaderGallery;
pub use template::assemble;

/// Source dialect of a gallery shader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDialect {
    /// Defines `main()` and writes `fragColor`
    Raw,
    /// Defines `mainImage(out vec4 fragColor, in vec2 fragCoord)`
    ShaderToy,
}

impl ShaderDialect {
    /// Guess the dialect from source text
    pub fn infer(source: &str) -> Self {
        if source.contains("mainImage") {
            ShaderDialect::ShaderToy
        } else {
            ShaderDialect::Raw
        }
    }
}

/// A gallery entry
#[derive(Debug, Clone)]
pub struct ShaderDescriptor {
    pub name: String,
    pub dialect: ShaderDialect,
    pub source: String,
}

impl ShaderDescriptor {
    pub fn new(name: &str, dialect: ShaderDialect, source: &str) -> Self {
        Self {
            name: name.to_string(),
            dialect,
            source: source.to_string(),
        }
    }

    /// Complete GLSL fragment shader with injected uniforms
    pub fn assembled(&self) -> String {
        assemble(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_dialect() {
        assert_eq!(
            ShaderDialect::infer("void mainImage(out vec4 c, in vec2 p) {}"),
            ShaderDialect::ShaderToy
        );
        assert_eq!(ShaderDialect::infer("void main() {}"), ShaderDialect::Raw);
    }
}
