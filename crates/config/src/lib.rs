//! Layered configuration for iconsprite.
//!
//! Values are merged in order, later sources overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. the user-level file (`iconsprite.toml` in the platform config directory),
//! 3. the project file (`iconsprite.toml`, `.yaml`, `.yml` or `.json` in the
//!    working directory) or a single explicitly requested file,
//! 4. environment variables prefixed with `ICONSPRITE_`, using `__` to reach
//!    nested keys (`ICONSPRITE_SPRITES__ICONS__IMPORT_PATTERNS=[./icons/*.svg]`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use iconsprite_processors::ProcessorSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const DEFAULT_SPRITE: &str = "default";
pub const DEFAULT_IMPORT_PATTERN: &str = "./assets/symbols/*.svg";
const FILE_STEM: &str = "iconsprite";
const ENV_PREFIX: &str = "ICONSPRITE_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for import patterns and relative event paths.
    pub src_dir: PathBuf,
    /// Where generated sprites and modules are written.
    pub out_dir: PathBuf,
    pub base_url: String,
    pub build_assets_dir: String,
    /// Adds `aria-hidden` to rendered icons at runtime.
    pub aria_hidden: bool,
    pub dev: bool,
    pub sprites: BTreeMap<String, SpriteSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("."),
            out_dir: PathBuf::from(".iconsprite"),
            base_url: "/".to_string(),
            build_assets_dir: "/_assets/".to_string(),
            aria_hidden: false,
            dev: false,
            sprites: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteSettings {
    pub import_patterns: Vec<String>,
    /// Extra files, keyed by a descriptive name. The symbol id still comes
    /// from the file name.
    pub symbol_files: BTreeMap<String, PathBuf>,
    /// Run on every icon before it becomes a `<symbol>`.
    pub process_sprite_symbol: Vec<ProcessorSpec>,
    /// Run once on the assembled sprite.
    pub process_sprite: Vec<ProcessorSpec>,
}

impl SpriteSettings {
    pub fn with_patterns<I: IntoIterator<Item = S>, S: Into<String>>(patterns: I) -> Self {
        Self { import_patterns: patterns.into_iter().map(Into::into).collect(), ..Self::default() }
    }
}

impl Settings {
    /// Loads settings from every layer. An explicit `path` replaces the
    /// project file lookup and must exist.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(user) = user_config_file() {
            tracing::debug!(path = %user.display(), "merging user configuration");
            figment = figment.merge(Toml::file(user));
        }
        figment = match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                merge_file(figment, path)?
            },
            None => figment
                .merge(Toml::file(format!("{FILE_STEM}.toml")))
                .merge(Yaml::file(format!("{FILE_STEM}.yaml")))
                .merge(Yaml::file(format!("{FILE_STEM}.yml")))
                .merge(Json::file(format!("{FILE_STEM}.json"))),
        };
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts, completes and validates settings from an assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let mut settings: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        settings.ensure_default_sprite();
        settings.validate()?;
        Ok(settings)
    }

    /// Adds the `default` sprite when the configuration doesn't mention it.
    pub fn ensure_default_sprite(&mut self) {
        self.sprites
            .entry(DEFAULT_SPRITE.to_string())
            .or_insert_with(|| SpriteSettings::with_patterns([DEFAULT_IMPORT_PATTERN]));
    }

    pub fn validate(&self) -> Result<()> {
        for name in self.sprites.keys() {
            if name.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid("sprite names must not be empty".to_string()));
            }
            if name.contains('/') {
                exn::bail!(ErrorKind::Invalid(format!("sprite name `{name}` must not contain `/`")));
            }
        }
        Ok(())
    }

    /// Public URL directory that built sprites are served from, always with a
    /// leading and trailing slash.
    ///
    /// ```
    /// use iconsprite_config::Settings;
    ///
    /// let settings = Settings { base_url: "./".into(), build_assets_dir: "_nuxt".into(), ..Settings::default() };
    /// assert_eq!(settings.public_assets_dir(), "/_nuxt/");
    /// ```
    pub fn public_assets_dir(&self) -> String {
        let base = match self.base_url.strip_prefix("./") {
            Some(rest) => format!("/{rest}"),
            None => self.base_url.clone(),
        };
        let joined = [base.trim_matches('/'), self.build_assets_dir.trim_matches('/')]
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        match joined.is_empty() {
            true => "/".to_string(),
            false => format!("/{joined}/"),
        }
    }
}

fn user_config_file() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", FILE_STEM)?;
    let file = dirs.config_dir().join(format!("{FILE_STEM}.toml"));
    file.is_file().then_some(file)
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn defaults_include_the_default_sprite() {
        let settings = Settings::from_figment(Figment::from(Serialized::defaults(Settings::default()))).unwrap();
        assert_eq!(settings.sprites.len(), 1);
        assert_eq!(settings.sprites[DEFAULT_SPRITE].import_patterns, [DEFAULT_IMPORT_PATTERN]);
        assert_eq!(settings.out_dir, Path::new(".iconsprite"));
    }

    #[test]
    fn project_file_and_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "iconsprite.toml",
                r#"
                    aria_hidden = true

                    [sprites.ui]
                    import_patterns = ["./ui/*.svg", "!./ui/draft-*.svg"]
                    process_sprite_symbol = [
                        { kind = "remove-sizes" },
                        { kind = "remove-tags", tags = ["title"] },
                    ]
                "#,
            )?;
            jail.set_env("ICONSPRITE_DEV", "true");
            jail.set_env("ICONSPRITE_BASE_URL", "/app/");
            let settings = Settings::load(None).unwrap();
            assert!(settings.aria_hidden);
            assert!(settings.dev);
            assert_eq!(settings.base_url, "/app/");
            assert_eq!(settings.sprites.keys().collect::<Vec<_>>(), ["default", "ui"]);
            let ui = &settings.sprites["ui"];
            assert_eq!(ui.import_patterns, ["./ui/*.svg", "!./ui/draft-*.svg"]);
            assert_eq!(
                ui.process_sprite_symbol,
                [ProcessorSpec::RemoveSizes, ProcessorSpec::RemoveTags { tags: vec!["title".to_string()] }]
            );
            Ok(())
        });
    }

    #[test]
    fn explicit_yaml_file_overrides_default_sprite() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.yml",
                "sprites:\n  default:\n    import_patterns: ['./icons/*.svg']\n    process_sprite:\n      - kind: css-prefix\n",
            )?;
            let settings = Settings::load(Some(Path::new("custom.yml"))).unwrap();
            let default = &settings.sprites[DEFAULT_SPRITE];
            assert_eq!(default.import_patterns, ["./icons/*.svg"]);
            assert_eq!(default.process_sprite, [ProcessorSpec::CssPrefix]);
            Ok(())
        });
    }

    #[test]
    fn explicit_file_must_exist() {
        Jail::expect_with(|_| {
            let err = Settings::load(Some(Path::new("missing.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::NotFound(_)));
            Ok(())
        });
    }

    #[test]
    fn unsupported_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("config.ini", "dev = true")?;
            let err = Settings::load(Some(Path::new("config.ini"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
            Ok(())
        });
    }

    #[test]
    fn malformed_processor_is_a_load_error() {
        Jail::expect_with(|jail| {
            jail.create_file("iconsprite.json", r#"{"sprites": {"a": {"process_sprite": [{"kind": "shrink"}]}}}"#)?;
            let err = Settings::load(None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }

    #[rstest]
    #[case("")]
    #[case("  ")]
    #[case("a/b")]
    fn test_invalid_sprite_names(#[case] name: &str) {
        let mut settings = Settings::default();
        settings.sprites.insert(name.to_string(), SpriteSettings::default());
        let err = settings.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[rstest]
    #[case("/", "/_assets/", "/_assets/")]
    #[case("/app/", "/_assets/", "/app/_assets/")]
    #[case("./", "_nuxt", "/_nuxt/")]
    #[case("./app", "assets/", "/app/assets/")]
    #[case("/", "/", "/")]
    #[case("", "", "/")]
    fn test_public_assets_dir(#[case] base_url: &str, #[case] assets: &str, #[case] expected: &str) {
        let settings = Settings { base_url: base_url.into(), build_assets_dir: assets.into(), ..Settings::default() };
        assert_eq!(settings.public_assets_dir(), expected);
    }
}
