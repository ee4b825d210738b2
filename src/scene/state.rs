use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::animator::{Animator, RotationPolicy};
use super::shapes::{FamilyDefinition, ShapeFamily, ShapePopulation};
use super::text::{TextOutcome, TextRegenerator};
use crate::error::SceneError;
use crate::gfx::geometry::typeface::{FontError, Typeface};
use crate::gfx::scene::{NodeKind, SceneGraph};
use crate::params::{ChangeTarget, ParamChange, ParamId, ParamValue, ParameterStore};

/// Where the typeface stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontStatus {
    Pending,
    Loaded { family: String },
    Failed(String),
}

/// Configures a [`SceneState`]
///
/// ```rust
/// use typescape::scene::{RotationPolicy, SceneBuilder};
///
/// let mut scene = SceneBuilder::new()
///     .seed(Some(7))
///     .rotation_policy(RotationPolicy::Accumulate)
///     .build();
/// scene.populate();
/// assert_eq!(scene.shapes().len(), 500);
/// ```
#[derive(Debug)]
pub struct SceneBuilder {
    families: Vec<FamilyDefinition>,
    policy: RotationPolicy,
    seed: Option<u64>,
    parameters: Option<ParameterStore>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            families: FamilyDefinition::defaults(),
            policy: RotationPolicy::default(),
            seed: None,
            parameters: None,
        }
    }

    pub fn families(mut self, families: Vec<FamilyDefinition>) -> Self {
        self.families = families;
        self
    }

    pub fn rotation_policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fixed seed for reproducible layouts; `None` draws from OS entropy
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn parameters(mut self, parameters: ParameterStore) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn build(self) -> SceneState {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        // Every commit lands in the queue before `set` returns
        let mut params = self.parameters.unwrap_or_default();
        let changes = ChangeQueue::default();
        let sink = changes.clone();
        params.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        SceneState {
            params,
            changes,
            graph: SceneGraph::new(),
            shapes: ShapePopulation::default(),
            populated: false,
            families: self.families,
            text: TextRegenerator::new(),
            animator: Animator::new(self.policy),
            rng,
            font: None,
            font_status: FontStatus::Pending,
        }
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

type ChangeQueue = Rc<RefCell<Vec<ParamChange>>>;

/// Everything the scene owns, mutated only from the UI thread
#[derive(Debug)]
pub struct SceneState {
    params: ParameterStore,
    /// Filled by the store's listener, drained after each edit
    changes: ChangeQueue,
    graph: SceneGraph,
    shapes: ShapePopulation,
    populated: bool,
    families: Vec<FamilyDefinition>,
    text: TextRegenerator,
    animator: Animator,
    rng: StdRng,
    font: Option<Typeface>,
    font_status: FontStatus,
}

impl SceneState {
    /// Creates and attaches the shape batches; later calls do nothing
    pub fn populate(&mut self) {
        if self.populated {
            return;
        }
        self.shapes = ShapePopulation::populate(&self.families, &self.params, &mut self.rng);
        self.shapes.attach(&mut self.graph);
        self.populated = true;
    }

    /// Commits a control value and runs its listener family synchronously
    ///
    /// Text edits rebuild the text mesh. A shape multiplier edit re-draws
    /// only the family it belongs to. The value is stored even when the
    /// text rebuild it triggers fails.
    pub fn set_param(
        &mut self,
        id: ParamId,
        value: impl Into<ParamValue>,
    ) -> Result<ParamChange, SceneError> {
        let change = self.params.set(id, value)?;
        self.dispatch_changes()?;
        Ok(change)
    }

    /// Same as [`set_param`](Self::set_param), addressing the control by config key
    pub fn set_param_by_key(
        &mut self,
        key: &str,
        value: impl Into<ParamValue>,
    ) -> Result<ParamChange, SceneError> {
        let id = ParamId::from_key(key)
            .ok_or_else(|| crate::params::ParamError::UnknownKey(key.to_string()))?;
        self.set_param(id, value)
    }

    /// Restores every default, then rebuilds text and re-scatters shapes once
    pub fn reset(&mut self) -> Result<(), SceneError> {
        self.params.reset();
        self.dispatch_changes()
    }

    /// Applies queued changes, each affected family and the text at most once
    fn dispatch_changes(&mut self) -> Result<(), SceneError> {
        let changes: Vec<ParamChange> = self.changes.borrow_mut().drain(..).collect();

        let mut text = false;
        let mut families: Vec<ShapeFamily> = Vec::new();
        for change in &changes {
            match change.target {
                ChangeTarget::Text => text = true,
                ChangeTarget::Shapes => {
                    if let Some(family) = ShapeFamily::for_param(change.id) {
                        if !families.contains(&family) {
                            families.push(family);
                        }
                    }
                }
            }
        }

        if !families.is_empty() {
            for family in families {
                self.shapes.update_family(family, &self.params, &mut self.rng);
            }
            self.shapes.sync(&mut self.graph);
        }
        if text {
            self.regenerate_text()?;
        }
        Ok(())
    }

    /// Receives the background font load result
    pub fn font_loaded(&mut self, result: Result<Typeface, FontError>) {
        match result {
            Ok(font) => {
                info!("Typeface '{}' ready", font.family_name);
                self.font_status = FontStatus::Loaded {
                    family: font.family_name.clone(),
                };
                self.font = Some(font);
                if let Err(err) = self.regenerate_text() {
                    warn!("Initial text mesh could not be built: {err}");
                }
            }
            Err(err) => {
                warn!("Typeface unavailable, text will not be shown: {err}");
                self.font_status = FontStatus::Failed(err.to_string());
            }
        }
    }

    pub fn start(&mut self) {
        self.animator.start();
    }

    /// One frame of animation followed by a transform sync
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let moved = self.animator.tick(&mut self.shapes, elapsed);
        if moved {
            self.shapes.sync(&mut self.graph);
        }
        moved
    }

    fn regenerate_text(&mut self) -> Result<TextOutcome, SceneError> {
        let options = self.params.text_options();
        self.text
            .update_text(&mut self.graph, self.font.as_ref(), &options)
            .map_err(|err| {
                warn!("Keeping previous text mesh: {err}");
                SceneError::from(err)
            })
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn shapes(&self) -> &ShapePopulation {
        &self.shapes
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn font(&self) -> Option<&Typeface> {
        self.font.as_ref()
    }

    pub fn font_status(&self) -> &FontStatus {
        &self.font_status
    }

    pub fn text_pending(&self) -> bool {
        self.text.is_pending()
    }

    pub fn text_mesh_count(&self) -> usize {
        self.graph.count_kind(NodeKind::Text)
    }

    pub fn shape_count(&self, family: ShapeFamily) -> usize {
        self.shapes.count(family)
    }
}
