use funnelforge::adapters::DefaultLayoutFactory;
use funnelforge::config::Settings;
use funnelforge::domain::StepRole;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults_without_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = Settings::from_root(temp_dir.path().to_str().unwrap())?;

    assert_eq!(settings.editor.container_width, "480px");
    assert_eq!(settings.editor.steps_field, "steps");
    assert_eq!(settings.persistence.url, "sqlite://funnelforge.db");
    assert_eq!(settings.persistence.max_connections, 5);
    assert!(settings.layouts.is_empty());
    Ok(())
}

#[test]
fn test_load_settings_and_layout_presets() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("config/layouts"))?;

    let funnelforge_toml = r##"
[editor]
background_color = "#fafafa"
container_width = "560px"
steps_field = "etapas"

[persistence]
url = "sqlite::memory:"
max_connections = 2
"##;
    fs::write(root.join("funnelforge.toml"), funnelforge_toml)?;

    // Preset in JSON
    let thank_you_json = r#"
{
    "role": "thank_you",
    "layout": {
        "components": [
            {"id": "ty-title", "type": "heading", "order": 0, "content": "Obrigado!", "level": 1, "alignment": "center"},
            {"id": "ty-text", "type": "text", "order": 1, "content": "Entraremos em contato."}
        ],
        "backgroundColor": "",
        "containerWidth": "480px",
        "padding": "24px"
    }
}
"#;
    fs::write(root.join("config/layouts/thank_you.json"), thank_you_json)?;

    // Preset in YAML
    let upsell_yaml = r#"
role: upsell
layout:
  components:
    - id: up-title
      type: heading
      order: 0
      content: Leve mais uma
    - id: up-button
      type: button
      order: 1
      label: Quero!
      actionTag: add_item
"#;
    fs::write(root.join("config/layouts/upsell.yaml"), upsell_yaml)?;

    // Ignored: not a supported extension
    fs::write(root.join("config/layouts/notes.txt"), "not a preset")?;

    let settings = Settings::from_root(root.to_str().unwrap())?;

    assert_eq!(settings.editor.background_color, "#fafafa");
    assert_eq!(settings.editor.container_width, "560px");
    assert_eq!(settings.editor.padding, "24px");
    assert_eq!(settings.editor.steps_field, "etapas");
    assert_eq!(settings.persistence.max_connections, 2);
    assert!(settings.persistence.auto_migrate);

    assert_eq!(settings.layouts.len(), 2);
    assert!(settings.layouts.iter().any(|p| p.role == "thank_you"));
    assert!(settings.layouts.iter().any(|p| p.role == "upsell"));

    let factory = DefaultLayoutFactory::from_settings(&settings);
    let document = factory.synthesize(&StepRole::parse("upsell"), "ignored");
    assert_eq!(document.len(), 2);
    assert_eq!(document.blocks[1].tag(), "button");
    assert_ne!(document.blocks[0].id, "up-title");

    // Roles without a preset use the built-in layout and the configured page settings.
    let builtin = factory.synthesize(&StepRole::InitialData, "Seus Dados");
    assert_eq!(builtin.container_width, "560px");
    assert_eq!(builtin.len(), 5);
    Ok(())
}

#[test]
fn test_invalid_settings_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    fs::write(
        root.join("funnelforge.toml"),
        "[persistence]\nurl = \"redis://localhost\"\nmax_connections = 0\n",
    )?;

    let err = Settings::from_root(root.to_str().unwrap()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Configuration validation failed"));
    assert!(message.contains("persistence.url"));
    assert!(message.contains("persistence.max_connections"));
    Ok(())
}

#[test]
fn test_duplicate_preset_roles_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("config/layouts"))?;

    let preset = "role = \"upsell\"\n\n[layout]\ncomponents = []\n";
    fs::write(root.join("config/layouts/a.toml"), preset)?;
    fs::write(root.join("config/layouts/b.toml"), preset)?;

    let err = Settings::from_root(root.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("upsell"));
    Ok(())
}

#[test]
fn test_empty_background_color_accepted() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::write(root.join("funnelforge.toml"), "[editor]\nbackground_color = \"\"\n")?;

    let settings = Settings::from_root(root.to_str().unwrap())?;
    assert_eq!(settings.editor.background_color, "");
    assert_eq!(settings.editor.page_defaults().background_color, "");
    Ok(())
}
