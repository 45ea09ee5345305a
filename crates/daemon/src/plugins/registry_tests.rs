// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::EventBus;
use async_trait::async_trait;
use compressarr_core::{ActionError, Job};
use std::path::Path;

struct NoopAction;

#[async_trait]
impl JobAction for NoopAction {
    async fn start(&self, job: Job) -> Result<Job, ActionError> {
        Ok(job)
    }

    async fn kill(&self, _job_id: &Path) -> Result<(), ActionError> {
        Ok(())
    }
}

fn noop_factory(_ctx: ActionContext) -> Result<Box<dyn JobAction>, PluginError> {
    Ok(Box::new(NoopAction))
}

fn candidate(name: &str) -> Candidate {
    candidate_at(name, &format!("/plugins/{}", name.replace('/', "-")))
}

fn candidate_at(name: &str, path: &str) -> Candidate {
    let mut manifest = PluginManifest::builder().name(name).build();
    let id = manifest.validate().unwrap();
    Candidate { id, path: PathBuf::from(path), manifest }
}

fn host() -> (HostContext, crate::bus::EventReader) {
    let (bus, reader) = EventBus::new();
    (HostContext::new(bus), reader)
}

/// Loader with entries for every named plugin, each registering the given
/// actions under itself.
fn loader_with(entries: &[(&str, &[&str])]) -> StaticLoader {
    let mut loader = StaticLoader::new();
    for (plugin, actions) in entries {
        let actions: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        loader.register(PluginId::parse(plugin).unwrap(), move |api| {
            for action in &actions {
                api.register_action(action.clone(), noop_factory);
            }
        });
    }
    loader
}

#[test]
fn plugins_load_in_discovery_order() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-b", &[]), ("compressarr-a", &[])]);
    let mut registry = PluginRegistry::new();
    registry.load(vec![candidate("compressarr-b"), candidate("compressarr-a")], &loader, None, &[]);
    registry.initialize(&host);

    let ids: Vec<&str> = registry.plugins().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["compressarr-b", "compressarr-a"]);
}

#[test]
fn duplicate_identifier_keeps_the_first() {
    let (_host, _reader) = host();
    let loader = loader_with(&[("compressarr-a", &[])]);
    let mut registry = PluginRegistry::new();
    registry.load(
        vec![
            candidate_at("compressarr-a", "/plugins/first"),
            candidate_at("compressarr-a", "/plugins/second"),
        ],
        &loader,
        None,
        &[],
    );

    assert_eq!(registry.len(), 1);
    let plugin = registry.get(&PluginId::parse("compressarr-a").unwrap()).unwrap();
    assert_eq!(plugin.path, PathBuf::from("/plugins/first"));
}

#[test]
fn allow_list_restricts_loading() {
    let loader = loader_with(&[("compressarr-a", &[]), ("compressarr-b", &[])]);
    let mut registry = PluginRegistry::new();
    registry.load(
        vec![candidate("compressarr-a"), candidate("compressarr-b")],
        &loader,
        Some(&["compressarr-b".to_string()]),
        &[],
    );

    assert_eq!(registry.len(), 1);
    assert!(registry.get(&PluginId::parse("compressarr-b").unwrap()).is_some());
}

#[test]
fn deny_list_loads_but_disables() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-x", &["enc"])]);
    let mut registry = PluginRegistry::new();
    registry.load(
        vec![candidate("compressarr-x")],
        &loader,
        None,
        &["compressarr-x".to_string()],
    );
    registry.initialize(&host);

    let plugin = registry.get(&PluginId::parse("compressarr-x").unwrap()).unwrap();
    assert!(plugin.disabled);
    // Initialization still ran, so the action map is populated.
    assert_eq!(plugin.action_names().collect::<Vec<_>>(), vec!["enc"]);
}

#[test]
fn missing_initializer_drops_the_plugin_only() {
    let loader = loader_with(&[("compressarr-good", &[])]);
    let mut registry = PluginRegistry::new();
    registry.load(
        vec![candidate("compressarr-missing"), candidate("compressarr-good")],
        &loader,
        None,
        &[],
    );

    assert_eq!(registry.len(), 1);
    assert!(registry.get(&PluginId::parse("compressarr-good").unwrap()).is_some());
}

#[tokio::test]
async fn initialization_attributes_and_announces_registrations() {
    let (host, mut reader) = host();
    let loader = loader_with(&[("compressarr-dummy", &["noop", "copy"])]);
    let mut registry = PluginRegistry::new();
    registry.load(vec![candidate("compressarr-dummy")], &loader, None, &[]);
    registry.initialize(&host);

    let plugin = registry.get(&PluginId::parse("compressarr-dummy").unwrap()).unwrap();
    let mut names: Vec<&str> = plugin.action_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["copy", "noop"]);

    let first = reader.recv().await.unwrap();
    let second = reader.recv().await.unwrap();
    for event in [first, second] {
        match event {
            Event::ActionRegistered { plugin, .. } => {
                assert_eq!(plugin.as_str(), "compressarr-dummy");
            }
            other => panic!("expected action:registered, got {other:?}"),
        }
    }
}

#[test]
fn zero_action_initializer_is_fine() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-quiet", &[])]);
    let mut registry = PluginRegistry::new();
    registry.load(vec![candidate("compressarr-quiet")], &loader, None, &[]);
    registry.initialize(&host);

    assert_eq!(registry.len(), 1);
    let unknown = registry.resolve(&ActionRef::parse("anything"));
    assert!(matches!(unknown, Err(ResolutionError::Unknown(_))));
}

#[test]
fn mis_declared_plugin_id_lands_in_the_translation_table() {
    let (host, _reader) = host();
    let mut loader = StaticLoader::new();
    loader.register(PluginId::parse("compressarr-actual").unwrap(), |api| {
        api.register_action_as(
            PluginId::parse("compressarr-typo").unwrap(),
            "enc",
            noop_factory,
        );
    });
    let mut registry = PluginRegistry::new();
    registry.load(vec![candidate("compressarr-actual")], &loader, None, &[]);
    registry.initialize(&host);

    // The registration belongs to the actual plugin...
    let actual = registry.get(&PluginId::parse("compressarr-actual").unwrap()).unwrap();
    assert_eq!(actual.action_names().collect::<Vec<_>>(), vec!["enc"]);

    // ...and lookups under the misspelled id still resolve.
    let via_typo = registry.resolve(&ActionRef::parse("compressarr-typo.enc"));
    assert!(via_typo.is_ok());
    let (plugin, _) = via_typo.unwrap();
    assert_eq!(plugin.id.as_str(), "compressarr-actual");
}

#[test]
fn bare_resolution_finds_the_single_contributor() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-a", &["enc"])]);
    let mut registry = PluginRegistry::new();
    registry.load(vec![candidate("compressarr-a")], &loader, None, &[]);
    registry.initialize(&host);

    let (plugin, _factory) = registry.resolve(&ActionRef::parse("enc")).unwrap();
    assert_eq!(plugin.id.as_str(), "compressarr-a");
}

#[test]
fn ambiguous_bare_name_lists_qualified_options() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-a", &["enc"]), ("compressarr-b", &["enc"])]);
    let mut registry = PluginRegistry::new();
    registry.load(vec![candidate("compressarr-a"), candidate("compressarr-b")], &loader, None, &[]);
    registry.initialize(&host);

    let err = registry.resolve(&ActionRef::parse("enc")).map(|_| ()).unwrap_err();
    match err {
        ResolutionError::Ambiguous { name, options } => {
            assert_eq!(name, "enc");
            assert_eq!(options, vec!["compressarr-a.enc", "compressarr-b.enc"]);
        }
        other => panic!("expected ambiguity, got {other}"),
    }

    // Qualifying picks one side without complaint.
    assert!(registry.resolve(&ActionRef::parse("compressarr-b.enc")).is_ok());
}

#[test]
fn disabling_one_contributor_removes_the_ambiguity() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-a", &["enc"]), ("compressarr-b", &["enc"])]);
    let mut registry = PluginRegistry::new();
    registry.load(
        vec![candidate("compressarr-a"), candidate("compressarr-b")],
        &loader,
        None,
        &["compressarr-a".to_string()],
    );
    registry.initialize(&host);

    let (plugin, _factory) = registry.resolve(&ActionRef::parse("enc")).unwrap();
    assert_eq!(plugin.id.as_str(), "compressarr-b");
}

#[test]
fn bare_name_served_only_by_disabled_plugins_reports_disabled() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-x", &["enc"])]);
    let mut registry = PluginRegistry::new();
    registry.load(
        vec![candidate("compressarr-x")],
        &loader,
        None,
        &["compressarr-x".to_string()],
    );
    registry.initialize(&host);

    assert!(matches!(
        registry.resolve(&ActionRef::parse("enc")),
        Err(ResolutionError::Disabled(id)) if id.as_str() == "compressarr-x"
    ));
}

#[test]
fn qualified_resolution_failures() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-x", &["enc"])]);
    let mut registry = PluginRegistry::new();
    registry.load(
        vec![candidate("compressarr-x")],
        &loader,
        None,
        &["compressarr-x".to_string()],
    );
    registry.initialize(&host);

    assert!(matches!(
        registry.resolve(&ActionRef::parse("compressarr-ghost.enc")),
        Err(ResolutionError::UnknownPlugin(_))
    ));
    assert!(matches!(
        registry.resolve(&ActionRef::parse("compressarr-x.enc")),
        Err(ResolutionError::Disabled(_))
    ));
}

#[test]
fn qualified_lookup_of_a_missing_action() {
    let (host, _reader) = host();
    let loader = loader_with(&[("compressarr-a", &["enc"])]);
    let mut registry = PluginRegistry::new();
    registry.load(vec![candidate("compressarr-a")], &loader, None, &[]);
    registry.initialize(&host);

    assert!(matches!(
        registry.resolve(&ActionRef::parse("compressarr-a.missing")),
        Err(ResolutionError::UnknownAction { .. })
    ));
}

#[test]
fn version_range_parsing_is_lenient_about_missing_patch() {
    assert_eq!(matches_range("0.2.0", "^0.2"), Some(true));
    assert_eq!(matches_range("1.75", ">=1.70"), Some(true));
    assert_eq!(matches_range("0.2.0", "^9.9.9"), Some(false));
    assert_eq!(matches_range("0.2.0", "not a range"), None);
}
