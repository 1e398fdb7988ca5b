//! Records a script into a fresh scene and plays it back.

use std::sync::Arc;

use crate::config::PlaybackConfig;
use crate::dsl::{Diagnostic, Script};
use crate::render::{GlyphSource, Renderer};
use crate::runtime::Runtime;
use crate::scene::Scene;

pub struct Player {
    script: Script,
    runtime: Runtime,
    scene: Scene,
}

impl Player {
    /// Parse `source`, run it against a recording scene, then switch the
    /// scene to playback. Parse problems are kept as diagnostics; whatever
    /// parsed is still run.
    pub fn load(source: &str, config: PlaybackConfig, glyphs: Arc<dyn GlyphSource>) -> Self {
        let script = Script::parse(source);
        let mut scene = Scene::new(config.bounds);
        let mut runtime = Runtime::new(config, glyphs);

        runtime.run(&mut scene, &script.statements);
        scene.finish_recording();
        log::info!(
            "loaded script: {} statements, {} diagnostics, {} objects",
            script.statements.len(),
            script.diagnostics.len(),
            runtime.objects().len()
        );

        Self {
            script,
            runtime,
            scene,
        }
    }

    /// Advance playback by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        self.scene.update(dt, &mut self.runtime);
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        self.scene.render(renderer);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.script.diagnostics
    }

    /// Whether every scheduled action has fired.
    pub fn is_finished(&self) -> bool {
        self.scene.pending() == 0
    }
}
