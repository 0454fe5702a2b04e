//! `SimulationEngine` — module graph, registries, and the tick loop.

use crowd_agent::{AgentSummary, FrameInfo, SteeringAgent, WorldView};
use crowd_core::geometry::Point;
use crowd_core::{
    AgentId, AgentInitialConditions, AxisAlignedBox, CrowdError, CrowdResult, OptionDictionary,
    SimClock,
};
use crowd_spatial::{AgentEntry, SegmentArena, SpatialIndex};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::emitter::AgentEmitter;
use crate::lifecycle::{EngineState, LifecycleStateMachine};
use crate::module::{Module, ModuleFactory, ModuleMeta};
use crate::options::{EngineController, NoopController, SimulationOptions};
use crate::scenario::Scenario;

// ── Obstacles ─────────────────────────────────────────────────────────────────

/// An obstacle registered with the engine.  Ownership is by the module that
/// added it; removal is explicit and only legal before the obstacle tree is
/// built at preprocess.
#[derive(Clone, Debug)]
pub enum Obstacle {
    Box(AxisAlignedBox),
    Polygon(Vec<Point>),
}

impl Obstacle {
    /// Horizontal bounding box, used for navigation-grid blocking.
    pub fn bounds(&self) -> AxisAlignedBox {
        match self {
            Obstacle::Box(b) => *b,
            Obstacle::Polygon(points) => {
                let mut b = AxisAlignedBox::flat(
                    f32::INFINITY,
                    f32::NEG_INFINITY,
                    f32::INFINITY,
                    f32::NEG_INFINITY,
                );
                for p in points {
                    b.xmin = b.xmin.min(p.x);
                    b.xmax = b.xmax.max(p.x);
                    b.zmin = b.zmin.min(p.z);
                    b.zmax = b.zmax.max(p.z);
                }
                b
            }
        }
    }
}

/// Commands are plain functions so the table stays `Copy`-friendly and a
/// command can freely take `&mut` engine.
pub type CommandFn = fn(&mut SimulationEngine) -> CrowdResult<()>;

struct AgentSlot {
    agent: Option<Box<dyn SteeringAgent>>,
    owner: String,
}

// ── SimulationEngine ──────────────────────────────────────────────────────────

/// The central orchestrator: owns the lifecycle state machine, the module
/// list (in dependency execution order), the agent and obstacle
/// registries, the spatial index, and the clock.
///
/// Agent iteration inside a tick is sequential and in registration order —
/// no parallelism — so that replaying a recording reproduces a run
/// bit-for-bit.
pub struct SimulationEngine {
    state: LifecycleStateMachine,
    options: SimulationOptions,
    controller: Box<dyn EngineController>,
    clock: SimClock,

    // Modules, in execution order (after all their dependencies).
    modules: Vec<Option<Box<dyn Module>>>,
    module_names: Vec<String>,
    meta: FxHashMap<String, ModuleMeta>,
    factories: FxHashMap<String, ModuleFactory>,

    // Agents and obstacles.
    agents: Vec<AgentSlot>,
    summaries: Vec<AgentSummary>,
    obstacles: Vec<Option<(Obstacle, String)>>,

    spatial: SpatialIndex,
    emitters: Vec<AgentEmitter>,
    commands: FxHashMap<String, CommandFn>,

    staged_scenario: Option<Scenario>,
    simulation_stop_requested: bool,
    frames_simulated: u64,
}

impl SimulationEngine {
    /// A fresh engine in the `new` state.  Call [`init`](Self::init) next.
    pub fn new() -> Self {
        let options = SimulationOptions::default();
        Self {
            state: LifecycleStateMachine::new(),
            clock: SimClock::new(options.fixed_dt),
            spatial: SpatialIndex::new(options.world_bounds, options.grid_cell_size),
            options,
            controller: Box::new(NoopController),
            modules: Vec::new(),
            module_names: Vec::new(),
            meta: FxHashMap::default(),
            factories: FxHashMap::default(),
            agents: Vec::new(),
            summaries: Vec::new(),
            obstacles: Vec::new(),
            emitters: Vec::new(),
            commands: FxHashMap::default(),
            staged_scenario: None,
            simulation_stop_requested: false,
            frames_simulated: 0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.state.current()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Live per-agent summaries, indexed by `AgentId`.
    pub fn summaries(&self) -> &[AgentSummary] {
        &self.summaries
    }

    pub fn agent(&self, id: AgentId) -> Option<&dyn SteeringAgent> {
        self.agents
            .get(id.index())
            .and_then(|slot| slot.agent.as_deref())
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn enabled_agent_count(&self) -> usize {
        self.summaries.iter().filter(|s| s.enabled).count()
    }

    pub fn is_module_loaded(&self, name: &str) -> bool {
        self.meta.get(name).is_some_and(|m| m.loaded)
    }

    pub fn module_meta(&self, name: &str) -> Option<&ModuleMeta> {
        self.meta.get(name)
    }

    /// Module names in execution order.
    pub fn modules_in_execution_order(&self) -> &[String] {
        &self.module_names
    }

    pub fn is_simulation_loaded(&self) -> bool {
        !matches!(
            self.state(),
            EngineState::New
                | EngineState::Initializing
                | EngineState::Ready
                | EngineState::LoadingModule
                | EngineState::UnloadingModule
                | EngineState::CleaningUp
                | EngineState::Finished
        )
    }

    pub fn is_simulation_running(&self) -> bool {
        matches!(
            self.state(),
            EngineState::SimulationReadyForUpdate | EngineState::UpdatingSimulation
        )
    }

    pub fn frames_simulated(&self) -> u64 {
        self.frames_simulated
    }

    // ── Engine lifecycle ──────────────────────────────────────────────────

    /// Initialise the engine: register the built-in modules and adopt the
    /// options and controller.  `new` → `ready`.
    pub fn init(
        &mut self,
        options: SimulationOptions,
        controller: Box<dyn EngineController>,
    ) -> CrowdResult<()> {
        self.state.transition(EngineState::Initializing)?;
        self.clock = SimClock::new(options.fixed_dt);
        self.spatial = SpatialIndex::new(options.world_bounds, options.grid_cell_size);
        self.options = options;
        self.controller = controller;
        crate::modules::register_builtins(self);
        self.state.transition(EngineState::Ready)
    }

    /// Unload every module (reverse execution order) and shut down.
    pub fn finish(&mut self) -> CrowdResult<()> {
        self.state.transition(EngineState::CleaningUp)?;
        while let Some(name) = self.module_names.last().cloned() {
            self.unload_module_inner(&name, false)?;
        }
        self.state.transition(EngineState::Finished)
    }

    // ── Module harness ────────────────────────────────────────────────────

    /// Make `name` loadable.  External crates call this for their modules;
    /// built-ins are pre-registered by `init`.
    pub fn register_module_factory(&mut self, name: &str, factory: ModuleFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Load a module and, depth-first, its declared dependencies.
    ///
    /// Fails on unknown names, declared conflicts (checked both ways), and
    /// dependency cycles; modules loaded before the failure stay loaded.
    pub fn load_module(&mut self, name: &str, options: OptionDictionary) -> CrowdResult<()> {
        self.state.transition(EngineState::LoadingModule)?;
        let mut in_progress = Vec::new();
        let result = self.load_module_recursive(name, Some(options), &mut in_progress);
        self.state.transition(EngineState::Ready)?;
        result
    }

    fn load_module_recursive(
        &mut self,
        name: &str,
        options: Option<OptionDictionary>,
        in_progress: &mut Vec<String>,
    ) -> CrowdResult<()> {
        if self.is_module_loaded(name) {
            return Ok(());
        }
        if in_progress.iter().any(|n| n == name) {
            return Err(CrowdError::ModuleDependencyCycle { module: name.to_string() });
        }
        // A loaded module may have declared this name a conflict.
        for meta in self.meta.values() {
            if meta.loaded && meta.conflicts.iter().any(|c| c == name) {
                return Err(CrowdError::ModuleConflict {
                    module: name.to_string(),
                    conflicts_with: meta.name.clone(),
                });
            }
        }

        let factory = *self
            .factories
            .get(name)
            .ok_or_else(|| CrowdError::UnknownModule(name.to_string()))?;
        let mut module = factory();

        // The new module's own conflict declarations.
        for conflict in module.conflicts() {
            if self.is_module_loaded(&conflict) {
                return Err(CrowdError::ModuleConflict {
                    module: name.to_string(),
                    conflicts_with: conflict,
                });
            }
        }

        let dependencies = module.dependencies();
        in_progress.push(name.to_string());
        for dep in &dependencies {
            self.load_module_recursive(dep, None, in_progress)?;
        }
        in_progress.pop();

        // All dependencies are in place: register after them in execution
        // order, record meta, and initialise.
        for dep in &dependencies {
            if let Some(meta) = self.meta.get_mut(dep) {
                meta.dependents.push(name.to_string());
            }
        }
        self.meta.insert(
            name.to_string(),
            ModuleMeta {
                name: name.to_string(),
                dependencies,
                conflicts: module.conflicts(),
                dependents: Vec::new(),
                loaded: true,
                initialized: false,
            },
        );
        self.module_names.push(name.to_string());
        self.modules.push(Some(module));
        debug!(module = name, "module loaded");

        let opts = options.unwrap_or_else(|| self.options.options_for(name));
        let idx = self.modules.len() - 1;
        self.run_module_hook(idx, |module, engine| module.init(&opts, engine))?;
        if let Some(meta) = self.meta.get_mut(name) {
            meta.initialized = true;
        }
        Ok(())
    }

    /// Unload a module.  Refused while other modules depend on it unless
    /// `recursive`, in which case the dependents unload first.
    pub fn unload_module(&mut self, name: &str, recursive: bool) -> CrowdResult<()> {
        self.state.transition(EngineState::UnloadingModule)?;
        let result = self.unload_module_inner(name, recursive);
        self.state.transition(EngineState::Ready)?;
        result
    }

    fn unload_module_inner(&mut self, name: &str, recursive: bool) -> CrowdResult<()> {
        let Some(meta) = self.meta.get(name) else {
            return Err(CrowdError::UnknownModule(name.to_string()));
        };
        let dependents = meta.dependents.clone();
        if !dependents.is_empty() {
            if !recursive {
                return Err(CrowdError::Config(format!(
                    "module '{name}' is required by {dependents:?}; unload them first or pass recursive"
                )));
            }
            for dependent in dependents {
                if self.is_module_loaded(&dependent) {
                    self.unload_module_inner(&dependent, true)?;
                }
            }
        }

        self.destroy_agents_from(name);
        if let Some(idx) = self.module_names.iter().position(|n| n == name) {
            self.run_module_hook(idx, |module, engine| module.finish(engine))?;
            self.module_names.remove(idx);
            self.modules.remove(idx);
        }
        self.meta.remove(name);
        for meta in self.meta.values_mut() {
            meta.dependents.retain(|d| d != name);
        }
        debug!(module = name, "module unloaded");
        Ok(())
    }

    /// Run one module hook with the module's slot vacated, so the hook can
    /// call back into the engine.
    fn run_module_hook<F>(&mut self, idx: usize, f: F) -> CrowdResult<()>
    where
        F: FnOnce(&mut dyn Module, &mut SimulationEngine) -> CrowdResult<()>,
    {
        let Some(name) = self.module_names.get(idx).cloned() else {
            return Ok(());
        };
        let Some(mut module) = self.modules[idx].take() else {
            return Ok(());
        };
        let result = f(module.as_mut(), self);
        // The list may have shifted if the hook loaded or unloaded modules;
        // put the module back where its name now lives.  If the hook
        // unloaded this very module, the name is gone and the box drops.
        if let Some(pos) = self.module_names.iter().position(|n| *n == name) {
            if self.modules[pos].is_none() {
                self.modules[pos] = Some(module);
            }
        }
        result
    }

    /// Run a hook over every module in execution order.
    fn run_all_module_hooks<F>(&mut self, mut f: F) -> CrowdResult<()>
    where
        F: FnMut(&mut dyn Module, &mut SimulationEngine) -> CrowdResult<()>,
    {
        let mut idx = 0;
        while idx < self.modules.len() {
            self.run_module_hook(idx, &mut f)?;
            idx += 1;
        }
        Ok(())
    }

    // ── Simulation lifecycle ──────────────────────────────────────────────

    /// Stage a scenario for the test-case player to pick up at
    /// `initialize_simulation`.
    pub fn stage_scenario(&mut self, scenario: Scenario) {
        self.staged_scenario = Some(scenario);
    }

    pub(crate) fn take_staged_scenario(&mut self) -> Option<Scenario> {
        self.staged_scenario.take()
    }

    /// `ready` → `simulation-loaded`: modules create their agents and
    /// obstacles here.  A failing module aborts the load and returns the
    /// engine to `ready`.
    pub fn initialize_simulation(&mut self) -> CrowdResult<()> {
        self.state.transition(EngineState::LoadingSimulation)?;
        self.frames_simulated = 0;
        self.simulation_stop_requested = false;
        self.clock.reset();

        let result = self.run_all_module_hooks(|m, e| m.initialize_simulation(e));
        match result {
            Ok(()) => self.state.transition(EngineState::SimulationLoaded),
            Err(e) => {
                warn!(error = %e, "simulation load failed; returning to ready");
                self.state.transition(EngineState::Ready)?;
                Err(e)
            }
        }
    }

    /// `simulation-loaded` → `simulation-ready-for-update`: builds the
    /// obstacle tree (once; immutable for the simulation) and the first
    /// agent tree, then runs module preprocess hooks.
    pub fn preprocess_simulation(&mut self) -> CrowdResult<()> {
        self.state.transition(EngineState::PreprocessingSimulation)?;

        let mut arena = SegmentArena::new();
        let mut arena_result: CrowdResult<()> = Ok(());
        for entry in self.obstacles.iter().flatten() {
            let result = match &entry.0 {
                Obstacle::Box(b) => arena.add_box(b).map(|_| ()),
                Obstacle::Polygon(points) => arena.add_polygon(points).map(|_| ()),
            };
            if let Err(e) = result {
                arena_result = Err(e);
                break;
            }
            self.spatial.grid_mut().block_box(&entry.0.bounds());
        }
        if let Err(e) = arena_result {
            self.state.transition(EngineState::Ready)?;
            return Err(e);
        }
        self.spatial.build_obstacle_tree(arena);
        self.rebuild_agent_tree();

        match self.run_all_module_hooks(|m, e| m.preprocess_simulation(e)) {
            Ok(()) => self.state.transition(EngineState::SimulationReadyForUpdate),
            Err(e) => {
                warn!(error = %e, "simulation preprocess failed; returning to ready");
                self.state.transition(EngineState::Ready)?;
                Err(e)
            }
        }
    }

    /// One engine update.
    ///
    /// Always advances the real-time clock.  When `paused`, nothing else
    /// happens and the call reports `true`.  Otherwise one fixed timestep
    /// is simulated: module preprocess-frame hooks, emitter expansion,
    /// agent-tree rebuild, the sequential agent sweep, then postprocess
    /// hooks.  Reports `false` once a module requested termination, the
    /// frame budget was reached, or the controller asked to stop.
    pub fn update(&mut self, paused: bool) -> CrowdResult<bool> {
        self.state.transition(EngineState::UpdatingSimulation)?;
        self.clock.advance_real_time();

        if paused {
            self.state.transition(EngineState::SimulationReadyForUpdate)?;
            return Ok(true);
        }

        self.clock.advance_sim_frame();
        let frame = FrameInfo {
            time: self.clock.sim_time(),
            dt: self.clock.dt(),
            frame: self.clock.frame() - 1,
        };

        self.run_all_module_hooks(|m, e| m.preprocess_frame(e, frame))?;
        self.process_emitters(frame.frame);

        // The agent tree is invalid during this rebuild; agents only run
        // after it completes.
        self.rebuild_agent_tree();

        for i in 0..self.agents.len() {
            let Some(mut agent) = self.agents[i].agent.take() else {
                continue;
            };
            if agent.enabled() {
                let world = WorldView::new(&self.spatial, &self.summaries);
                let result = agent.update_ai(frame, &world);
                if let Err(e) = result {
                    // Non-fatal per the error policy: drop the offender,
                    // keep the simulation running.
                    warn!(agent = %agent.id(), error = %e, "agent update failed; disabling");
                    agent.disable();
                }
            }
            // Sequential write-back: later agents see this agent's new state.
            self.summaries[i] = agent.summary();
            self.agents[i].agent = Some(agent);
        }

        self.run_all_module_hooks(|m, e| m.postprocess_frame(e, frame))?;
        self.frames_simulated += 1;

        let budget_reached =
            self.options.max_frames > 0 && self.frames_simulated >= self.options.max_frames;
        let done = self.simulation_stop_requested
            || budget_reached
            || self.controller.stop_requested();

        if done {
            self.state
                .transition(EngineState::SimulationNoMoreUpdatesAllowed)?;
        } else {
            self.state.transition(EngineState::SimulationReadyForUpdate)?;
        }
        Ok(!done)
    }

    /// Module postprocess hooks; agents remain alive for them to inspect.
    pub fn postprocess_simulation(&mut self) -> CrowdResult<()> {
        self.state.transition(EngineState::PostprocessingSimulation)?;
        self.run_all_module_hooks(|m, e| m.postprocess_simulation(e))?;
        self.state.transition(EngineState::SimulationFinished)
    }

    /// Tear the simulation down and return to `ready`.
    pub fn cleanup_simulation(&mut self) -> CrowdResult<()> {
        self.state.transition(EngineState::UnloadingSimulation)?;
        self.run_all_module_hooks(|m, e| m.cleanup_simulation(e))?;

        // Anything modules did not destroy themselves goes now.
        let owners: Vec<String> = self.module_names.clone();
        for owner in owners {
            self.destroy_agents_from(&owner);
        }
        self.agents.clear();
        self.summaries.clear();
        self.obstacles.clear();
        self.emitters.clear();
        self.spatial = SpatialIndex::new(self.options.world_bounds, self.options.grid_cell_size);
        self.state.transition(EngineState::Ready)
    }

    /// Ask the engine to stop at the end of the current tick.  Modules use
    /// this to signal termination; drivers usually use the controller.
    pub fn request_simulation_stop(&mut self) {
        self.simulation_stop_requested = true;
    }

    // ── Agents ────────────────────────────────────────────────────────────

    /// Create an agent through its owner module's factory and register it.
    ///
    /// This is the single pathway all agent creation funnels through: the
    /// scenario feeder, emitters, and replay all end up here.
    pub fn create_agent(
        &mut self,
        initial: &AgentInitialConditions,
        owner: &str,
    ) -> CrowdResult<AgentId> {
        let idx = self
            .module_names
            .iter()
            .position(|n| n == owner)
            .ok_or_else(|| CrowdError::UnknownModule(owner.to_string()))?;
        let id = AgentId(self.agents.len() as u32);
        let seed = self.options.seed;

        let agent = self.modules[idx]
            .as_mut()
            .and_then(|m| m.create_agent(id, seed))
            .ok_or_else(|| {
                CrowdError::Config(format!("module '{owner}' does not provide agents"))
            })?;
        self.adopt_agent(initial, owner, agent)
    }

    /// The id the next created agent will receive.  Modules constructing
    /// their own agents (replay tracks) must build them with this id.
    pub fn next_agent_id(&self) -> AgentId {
        AgentId(self.agents.len() as u32)
    }

    /// Register an agent the owner module constructed itself (the replay
    /// feeder does this, since it builds agents from recorded tracks).
    pub fn adopt_agent(
        &mut self,
        initial: &AgentInitialConditions,
        owner: &str,
        mut agent: Box<dyn SteeringAgent>,
    ) -> CrowdResult<AgentId> {
        if !self.is_simulation_loaded() {
            return Err(CrowdError::InvalidLifecycleTransition {
                from: self.state().name(),
                to: "create-agent",
            });
        }
        if agent.id() != self.next_agent_id() {
            return Err(CrowdError::Config(format!(
                "agent id {} does not match the next registry slot {}",
                agent.id(),
                self.next_agent_id()
            )));
        }
        {
            let world = WorldView::new(&self.spatial, &self.summaries);
            agent.reset(initial, &world)?;
        }
        let id = agent.id();
        let summary = agent.summary();
        self.agents.push(AgentSlot { agent: Some(agent), owner: owner.to_string() });
        self.summaries.push(summary);
        debug!(agent = %id, owner, "agent created");
        Ok(id)
    }

    /// Destroy one agent, routing the notification to its owner module.
    pub fn destroy_agent(&mut self, id: AgentId) -> CrowdResult<()> {
        let Some(slot) = self.agents.get_mut(id.index()) else {
            return Ok(());
        };
        let Some(agent) = slot.agent.take() else {
            return Ok(());
        };
        let owner = slot.owner.clone();
        self.summaries[id.index()] = AgentSummary::disabled(id);
        if let Some(idx) = self.module_names.iter().position(|n| n == &owner) {
            if let Some(module) = self.modules[idx].as_mut() {
                module.destroy_agent(agent.as_ref());
            }
        }
        Ok(())
    }

    /// Destroy every agent owned by `owner` (module unload, teardown).
    pub fn destroy_agents_from(&mut self, owner: &str) {
        let ids: Vec<AgentId> = self
            .agents
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.owner == owner && slot.agent.is_some())
            .map(|(i, _)| AgentId(i as u32))
            .collect();
        for id in ids {
            let _ = self.destroy_agent(id);
        }
    }

    fn rebuild_agent_tree(&mut self) {
        let entries = self.summaries.iter().filter(|s| s.enabled).map(|s| AgentEntry {
            id: s.id,
            position: s.position,
            radius: s.radius,
        });
        // Collect before handing over: the iterator borrows summaries.
        let entries: Vec<AgentEntry> = entries.collect();
        self.spatial.build_agent_tree(entries);
    }

    // ── Obstacles ─────────────────────────────────────────────────────────

    /// Register an obstacle.  Only legal before the obstacle tree is built
    /// (the tree is immutable for the duration of a simulation).
    pub fn add_obstacle(&mut self, obstacle: Obstacle, owner: &str) -> CrowdResult<usize> {
        if self.is_simulation_running() {
            return Err(CrowdError::InvalidLifecycleTransition {
                from: self.state().name(),
                to: "add-obstacle",
            });
        }
        self.obstacles.push(Some((obstacle, owner.to_string())));
        Ok(self.obstacles.len() - 1)
    }

    /// Remove an obstacle added earlier.  Same gating as `add_obstacle`.
    pub fn remove_obstacle(&mut self, id: usize) -> CrowdResult<bool> {
        if self.is_simulation_running() {
            return Err(CrowdError::InvalidLifecycleTransition {
                from: self.state().name(),
                to: "remove-obstacle",
            });
        }
        Ok(self
            .obstacles
            .get_mut(id)
            .and_then(|slot| slot.take())
            .is_some())
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.iter().flatten().count()
    }

    // ── Emitters ──────────────────────────────────────────────────────────

    pub fn add_emitter(&mut self, emitter: AgentEmitter) {
        self.emitters.push(emitter);
    }

    fn process_emitters(&mut self, frame: u64) {
        for idx in 0..self.emitters.len() {
            if !self.emitters[idx].due(frame) {
                continue;
            }
            if let Some(region) = self.emitters[idx].trigger_region {
                let triggered = self
                    .summaries
                    .iter()
                    .any(|s| s.enabled && region.contains_xz(s.position));
                if !triggered {
                    continue;
                }
            }
            let template = self.emitters[idx].template.clone();
            let owner = self.emitters[idx].owner.clone();
            match self.create_agent(&template, &owner) {
                Ok(_) => self.emitters[idx].mark_spawned(frame),
                Err(e) => {
                    warn!(error = %e, "emitter spawn failed; emitter disabled");
                    // Repeat failures would spam every frame.
                    let total = self.emitters[idx].spawned();
                    self.emitters[idx].total = total;
                }
            }
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────

    pub fn add_command(&mut self, name: &str, command: CommandFn) {
        self.commands.insert(name.to_string(), command);
    }

    pub fn remove_command(&mut self, name: &str) {
        self.commands.remove(name);
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn run_command(&mut self, name: &str) -> CrowdResult<()> {
        let command = *self
            .commands
            .get(name)
            .ok_or_else(|| CrowdError::Config(format!("unknown command '{name}'")))?;
        command(self)
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}
