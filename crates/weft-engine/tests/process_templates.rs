use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weft_config::Config;
use weft_engine::TemplateEngine;
use weft_syntax::{ChunkKind, Encoding};

fn write(dir: &TempDir, relative: &str, bytes: &[u8]) {
    let path = dir.path().join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn processes_a_site_from_a_saved_config() {
    let site = TempDir::new().unwrap();
    write(
        &site,
        "Views/Index.cshtml",
        b"@using Site.Models\n<ul>\n@foreach (var p in Model) {\n<li>@p.Name</li>\n}\n</ul>\n",
    );
    write(
        &site,
        "Views/Wide.cshtml",
        &Encoding::Utf16Le.encode_with_bom("<b>@title</b>"),
    );
    write(&site, "Views/Draft.cshtml", b"<p>@(unfinished");

    let config_dir = TempDir::new().unwrap();
    let config_path = config_dir.path().join("config.toml");
    let mut config = Config::new(site.path());
    config.design_time = true;
    config.save_to_path(&config_path).unwrap();

    let loaded = Config::load_from_path(&config_path).unwrap().unwrap();
    let engine = TemplateEngine::from_config(&loaded).unwrap();
    let generated = engine.process_all().unwrap();

    let names: Vec<_> = generated.iter().map(|g| g.name()).collect();
    assert_eq!(
        names,
        vec!["Views/Draft.cshtml", "Views/Index.cshtml", "Views/Wide.cshtml"]
    );

    // Unfinished input is only a warning at design time
    let draft = &generated[0];
    assert!(!draft.has_errors());
    assert_eq!(draft.tree().diagnostics().len(), 1);

    let index = &generated[1];
    assert_eq!(
        index.chunks().chunks()[0].kind,
        ChunkKind::AddImport("Site.Models".to_string())
    );
    assert!(
        index
            .chunks()
            .iter()
            .any(|c| c.kind == ChunkKind::Expression("p.Name".to_string()))
    );

    let wide = &generated[2];
    assert_eq!(wide.tree().text(), "<b>@title</b>");
    assert_eq!(
        wide.chunks().chunks()[1].kind,
        ChunkKind::Expression("title".to_string())
    );
}
