// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The orchestrator that owns every optimization structure.

use crate::config::OptimizerConfig;
use crate::instrument::{
    point_name, CachedPathfinder, CulledDrawable, Deferred, InstrumentedGrid, InterceptRegistry,
    Interception, PooledFactory, Timed, TimedSubsystem, SPATIAL_INDEX_POINT,
};
use crate::overlay::OverlaySnapshot;
use crate::settings::{Optimization, OptimizationSettings};
use gambit_core::host::{Drawable, GridHost, OverlayCanvas, Pathfinder, Subsystem, Tracked};
use gambit_core::{
    Channel, Clock, EntityKey, OptimizerError, OptimizerResult, Point, Rect, SystemClock,
};
use gambit_data::{CacheStats, ObjectPool, ObjectPools, PoolStats, Pooled, ResultCache, SpatialIndex};
use gambit_telemetry::{MetricsRecorder, PerformanceReport, SampleSink, ScopedSampleTimer};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

struct OptimizerState {
    config: OptimizerConfig,
    settings: OptimizationSettings,
    viewport: Option<Rect>,
    pools: ObjectPools,
    spatial: SpatialIndex,
    cache: ResultCache,
}

impl OptimizerState {
    fn apply_settings(&mut self) {
        self.pools.set_enabled(self.settings.pooling);
        self.spatial.set_enabled(self.settings.spatial_hashing);
        self.cache.set_enabled(self.settings.caching);
    }
}

/// A handle to the runtime optimizer.
///
/// Cloning the handle is cheap and every clone drives the same optimizer;
/// decorators keep a clone so they can time and reroute the calls they wrap.
/// The optimizer is single-threaded.
///
/// Host callbacks handed to the optimizer (pool factories and reset hooks)
/// run while its state is borrowed and must not call back into it. Wrapped
/// host methods run with no borrow held and may use the optimizer freely.
#[derive(Clone)]
pub struct Optimizer {
    clock: Rc<dyn Clock>,
    metrics: Rc<RefCell<MetricsRecorder>>,
    state: Rc<RefCell<OptimizerState>>,
    interceptions: Rc<RefCell<InterceptRegistry>>,
}

impl Optimizer {
    /// Builds an optimizer from a validated `config`, reading time from `clock`.
    pub fn new(config: OptimizerConfig, clock: Rc<dyn Clock>) -> OptimizerResult<Self> {
        config.validate()?;
        let metrics = MetricsRecorder::new(
            clock.clone(),
            config.sample_capacity,
            config.monitoring_duration_secs,
        )?;
        let spatial = SpatialIndex::new(config.cell_size)?;
        let cache = ResultCache::new(clock.clone());

        let mut state = OptimizerState {
            settings: config.settings,
            viewport: config.viewport,
            pools: ObjectPools::new(),
            spatial,
            cache,
            config,
        };
        state.apply_settings();
        log::info!(
            "Optimizer ready: cell size {}, {} samples per channel, {:.1}s monitoring window",
            state.config.cell_size,
            state.config.sample_capacity,
            state.config.monitoring_duration_secs
        );

        Ok(Self {
            clock,
            metrics: Rc::new(RefCell::new(metrics)),
            state: Rc::new(RefCell::new(state)),
            interceptions: Rc::new(RefCell::new(InterceptRegistry::default())),
        })
    }

    /// Builds an optimizer that reads the system's monotonic clock.
    pub fn with_system_clock(config: OptimizerConfig) -> OptimizerResult<Self> {
        Self::new(config, Rc::new(SystemClock::new()))
    }

    /// The clock every timestamp is read from.
    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    /// The configuration the optimizer was built with.
    pub fn config(&self) -> OptimizerConfig {
        self.state.borrow().config.clone()
    }

    // --- Monitoring ---

    /// Clears all samples and starts a monitoring session.
    pub fn start_monitoring(&self) {
        self.metrics.borrow_mut().start_monitoring();
    }

    /// Ends the session and returns its report.
    pub fn stop_monitoring(&self) -> PerformanceReport {
        self.metrics.borrow_mut().stop_monitoring()
    }

    /// Builds a report without ending the session.
    pub fn generate_report(&self) -> PerformanceReport {
        self.metrics.borrow().generate_report()
    }

    /// Returns `true` while a session is active.
    pub fn is_monitoring(&self) -> bool {
        self.metrics.borrow().is_monitoring()
    }

    /// Records one frame of `dt` seconds.
    ///
    /// Returns the final report when the monitoring window has run out.
    pub fn tick(&self, dt: f64) -> Option<PerformanceReport> {
        self.metrics.borrow_mut().tick(dt)
    }

    /// Read access to the recorder. Do not hold the guard across timed calls.
    pub fn metrics(&self) -> Ref<'_, MetricsRecorder> {
        self.metrics.borrow()
    }

    /// Starts a timer that records into `channel` when dropped.
    pub fn timer(&self, channel: Channel) -> ScopedSampleTimer<'_, Self> {
        ScopedSampleTimer::new(self, &*self.clock, channel)
    }

    /// Runs `f` and records its duration under `channel`.
    pub fn time<R>(&self, channel: Channel, f: impl FnOnce() -> R) -> R {
        let _timer = self.timer(channel);
        f()
    }

    /// Runs the update pass `f`, recording it in the update series.
    pub fn time_update<R>(&self, f: impl FnOnce() -> R) -> R {
        self.time(Channel::Update, f)
    }

    /// Runs the draw pass `f`, recording it in the draw series.
    pub fn time_draw<R>(&self, f: impl FnOnce() -> R) -> R {
        self.time(Channel::Draw, f)
    }

    // --- Object pools ---

    /// Creates the pool `name` and fills it with `initial_size` objects.
    pub fn initialize_object_pool<T: 'static>(
        &self,
        name: &str,
        factory: impl Fn() -> T + 'static,
        initial_size: usize,
    ) {
        self.state
            .borrow_mut()
            .pools
            .initialize(name, factory, initial_size);
    }

    /// Registers a pre-configured pool, for example one with a reset hook.
    pub fn register_object_pool<T: 'static>(&self, pool: ObjectPool<T>, initial_size: usize) {
        self.state.borrow_mut().pools.register(pool, initial_size);
    }

    /// Takes an object from the pool `name`.
    ///
    /// Fails with [`OptimizerError::UnknownPoolType`] if the pool was never
    /// initialized, whether pooling is on or off.
    pub fn get_object<T: 'static>(&self, name: &str) -> OptimizerResult<Pooled<T>> {
        self.state.borrow_mut().pools.acquire(name)
    }

    /// Gives an object back to the pool `name`.
    pub fn return_object<T: 'static>(&self, name: &str, object: &Pooled<T>) -> OptimizerResult<()> {
        self.state.borrow_mut().pools.release(name, object)
    }

    /// Counters of the pool `name`.
    pub fn pool_stats(&self, name: &str) -> Option<PoolStats> {
        self.state.borrow().pools.pool_stats(name)
    }

    // --- Spatial index ---

    /// Resets the spatial index with a new cell size, forgetting all entities.
    pub fn initialize_spatial_hash(&self, cell_size: f64) -> OptimizerResult<()> {
        self.state.borrow_mut().spatial.initialize(cell_size)
    }

    /// Starts tracking `entity` at its current position.
    pub fn track_entity<E: Tracked + ?Sized>(&self, entity: &E) -> bool {
        self.state.borrow_mut().spatial.insert(entity)
    }

    /// Tracks `key` at `position`; `None` untracks it.
    pub fn track_key(&self, key: EntityKey, position: Option<Point>) -> bool {
        self.state.borrow_mut().spatial.insert_at(key, position)
    }

    /// Re-reads `entity`'s position and updates its cell.
    pub fn relocate_entity<E: Tracked + ?Sized>(&self, entity: &E) {
        self.state.borrow_mut().spatial.relocate(entity);
    }

    /// Stops tracking `key`.
    pub fn untrack_entity(&self, key: EntityKey) -> bool {
        self.state.borrow_mut().spatial.remove_key(key)
    }

    /// Every tracked entity within `radius` of `center`.
    ///
    /// Answers through the grid when spatial hashing is on and by a linear
    /// scan otherwise; the result set is the same.
    pub fn get_entities_in_range(&self, center: Point, radius: f64) -> Vec<EntityKey> {
        self.state.borrow().spatial.query_radius(center, radius)
    }

    /// Number of entities in the spatial index.
    pub fn tracked_entity_count(&self) -> usize {
        self.state.borrow().spatial.entity_count()
    }

    /// Drops empty grid cells and returns how many were removed.
    pub fn prune_spatial_cells(&self) -> usize {
        self.state.borrow_mut().spatial.prune_empty_cells()
    }

    // --- Result cache ---

    /// Stores `value` under `key` in `namespace` and hands it back.
    pub fn cache_result<K, V>(&self, namespace: &str, key: K, value: V) -> OptimizerResult<V>
    where
        K: Eq + Hash + 'static,
        V: Clone + 'static,
    {
        self.state.borrow_mut().cache.put(namespace, key, value)
    }

    /// Looks up a cached value no older than `max_age` seconds.
    pub fn get_cached_result<K, V>(&self, namespace: &str, key: &K, max_age: Option<f64>) -> Option<V>
    where
        K: Eq + Hash + 'static,
        V: Clone + 'static,
    {
        self.state.borrow_mut().cache.get(namespace, key, max_age)
    }

    /// Clears one namespace, or the whole cache when `namespace` is `None`.
    pub fn clear_cache(&self, namespace: Option<&str>) {
        self.state.borrow_mut().cache.clear(namespace);
    }

    /// Number of entries in `namespace`.
    pub fn cached_entries(&self, namespace: &str) -> usize {
        self.state.borrow().cache.len(namespace)
    }

    /// Cache hit/miss counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.state.borrow().cache.stats()
    }

    /// Maximum age of cached paths from the configuration.
    pub fn path_cache_max_age(&self) -> Option<f64> {
        self.state.borrow().config.path_cache_max_age_secs
    }

    // --- Settings ---

    /// Switches one optimization on or off. Takes effect on the next call.
    pub fn set_optimization(&self, optimization: Optimization, enabled: bool) {
        let mut state = self.state.borrow_mut();
        let previous = state.settings.set(optimization, enabled);
        state.apply_settings();
        if previous != enabled {
            log::info!(
                "Optimization '{optimization}' {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    /// Switches an optimization by name, e.g. `"spatialHashing"`.
    pub fn set_optimization_by_name(&self, name: &str, enabled: bool) -> OptimizerResult<()> {
        let optimization: Optimization = name.parse()?;
        self.set_optimization(optimization, enabled);
        Ok(())
    }

    /// Returns `true` if `optimization` is on.
    pub fn is_enabled(&self, optimization: Optimization) -> bool {
        self.state.borrow().settings.is_enabled(optimization)
    }

    /// The current toggle states.
    pub fn settings(&self) -> OptimizationSettings {
        self.state.borrow().settings
    }

    /// Sets the visible area used for culling.
    pub fn set_viewport(&self, viewport: Option<Rect>) {
        self.state.borrow_mut().viewport = viewport;
    }

    /// The visible area used for culling.
    pub fn viewport(&self) -> Option<Rect> {
        self.state.borrow().viewport
    }

    /// Returns `true` if an object with `bounds` should be skipped this frame.
    pub fn should_cull(&self, bounds: Option<Rect>) -> bool {
        let state = self.state.borrow();
        if !state.settings.culling {
            return false;
        }
        match (state.viewport, bounds) {
            (Some(viewport), Some(bounds)) => !viewport.intersects(&bounds),
            _ => false,
        }
    }

    // --- Interception ---

    /// Claims the points `<label>.<method>` for every method in `methods`.
    pub fn intercept(&self, label: &str, methods: &[&str]) -> OptimizerResult<Interception> {
        let points: Vec<String> = methods
            .iter()
            .map(|method| point_name(label, method))
            .collect();
        self.claim(points)
    }

    fn claim(&self, points: Vec<String>) -> OptimizerResult<Interception> {
        if let Err(err) = self.interceptions.borrow_mut().claim(&points) {
            log::warn!("Refusing to wrap twice: {err}");
            return Err(err);
        }
        log::info!("Intercepting {}", points.join(", "));
        Ok(Interception::new(&self.interceptions, points))
    }

    /// Fails if the object handed in is itself a decorator.
    fn refuse_nested(&self, wrapped_by: Option<&str>) -> OptimizerResult<()> {
        match wrapped_by {
            Some(point) => {
                let err = OptimizerError::AlreadyIntercepted {
                    point: point.to_string(),
                };
                log::warn!("Refusing to wrap twice: {err}");
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Returns `true` if `point` is currently wrapped.
    pub fn is_intercepted(&self, point: &str) -> bool {
        self.interceptions.borrow().contains(point)
    }

    /// Every wrapped point, in lexical order.
    pub fn intercepted_points(&self) -> Vec<String> {
        self.interceptions
            .borrow()
            .iter()
            .map(str::to_string)
            .collect()
    }

    /// Wraps an arbitrary callable with timing under `<label>.<method>`.
    pub fn wrap<F>(&self, label: &str, method: &str, inner: F) -> OptimizerResult<Timed<F>> {
        let interception = self.intercept(label, &[method])?;
        let channel = Channel::subsystem(point_name(label, method));
        Ok(Timed::new(self.clone(), interception, channel, inner))
    }

    /// Wraps a board so its entities are indexed and its calls timed.
    ///
    /// The spatial index serves one board at a time: while a board is
    /// instrumented, instrumenting another fails with
    /// [`OptimizerError::AlreadyIntercepted`] on [`SPATIAL_INDEX_POINT`].
    /// The index is cleared and rebuilt from the entities already on the board.
    pub fn instrument_grid<G: GridHost>(
        &self,
        label: &str,
        grid: G,
    ) -> OptimizerResult<InstrumentedGrid<G>> {
        self.refuse_nested(grid.intercepted_as())?;
        let mut points: Vec<String> = InstrumentedGrid::<G>::METHODS
            .iter()
            .map(|method| point_name(label, method))
            .collect();
        points.push(SPATIAL_INDEX_POINT.to_string());
        let interception = self.claim(points)?;
        self.state.borrow_mut().spatial.clear();
        Ok(InstrumentedGrid::new(self.clone(), interception, label, grid))
    }

    /// Wraps a pathfinder with the result cache, using `label` as namespace.
    pub fn cache_pathfinder<P: Pathfinder>(
        &self,
        label: &str,
        pathfinder: P,
    ) -> OptimizerResult<CachedPathfinder<P>> {
        self.refuse_nested(pathfinder.intercepted_as())?;
        let interception = self.intercept(label, &["find_path"])?;
        Ok(CachedPathfinder::new(
            self.clone(),
            interception,
            label,
            pathfinder,
            self.path_cache_max_age(),
        ))
    }

    /// Wraps a drawable with viewport culling and draw timing.
    pub fn cull_drawable<D: Drawable>(
        &self,
        label: &str,
        drawable: D,
    ) -> OptimizerResult<CulledDrawable<D>> {
        self.refuse_nested(drawable.intercepted_as())?;
        let interception = self.intercept(label, &["draw"])?;
        Ok(CulledDrawable::new(self.clone(), interception, label, drawable))
    }

    /// Registers a subsystem whose updates are timed under `<label>.update`.
    pub fn time_subsystem<S: Subsystem>(
        &self,
        label: &str,
        subsystem: S,
    ) -> OptimizerResult<TimedSubsystem<S>> {
        self.refuse_nested(subsystem.intercepted_as())?;
        let interception = self.intercept(label, &["update"])?;
        Ok(TimedSubsystem::new(self.clone(), interception, label, subsystem))
    }

    /// Replaces raw construction and destruction with the pool `pool`.
    ///
    /// The pool must already be initialized.
    pub fn pooled_factory<T: 'static>(&self, pool: &str) -> OptimizerResult<PooledFactory<T>> {
        if !self.state.borrow().pools.contains(pool) {
            return Err(OptimizerError::UnknownPoolType {
                pool: pool.to_string(),
            });
        }
        let interception = self.intercept(pool, &PooledFactory::<T>::METHODS)?;
        Ok(PooledFactory::new(self.clone(), interception, pool))
    }

    /// Defers `loader` to first access when lazy loading is on; loads now otherwise.
    pub fn defer<T: 'static>(&self, loader: impl FnOnce() -> T + 'static) -> Deferred<T> {
        let eager = !self.is_enabled(Optimization::LazyLoading);
        Deferred::new(self.clone(), loader, eager)
    }

    // --- Overlay ---

    /// Live counters for the debug overlay.
    pub fn overlay_snapshot(&self) -> OverlaySnapshot {
        let (monitoring, average_fps) = {
            let metrics = self.metrics.borrow();
            let frame_avg = metrics
                .series(&Channel::Frame)
                .map_or(0.0, |series| series.average());
            let fps = if frame_avg > 0.0 { 1.0 / frame_avg } else { 0.0 };
            (metrics.is_monitoring(), fps)
        };
        let state = self.state.borrow();
        OverlaySnapshot {
            monitoring,
            average_fps,
            pools: state.pools.stats(),
            spatial_cells: state.spatial.occupied_cell_count(),
            spatial_entities: state.spatial.entity_count(),
            cache_entries: state.cache.namespace_sizes(),
            cache_stats: state.cache.stats(),
            settings: state.settings,
        }
    }

    /// Writes the debug overlay onto `canvas` starting at (`x`, `y`).
    pub fn draw_overlay(&self, canvas: &mut dyn OverlayCanvas, x: f64, y: f64) {
        self.overlay_snapshot().draw(canvas, x, y);
    }
}

impl SampleSink for Optimizer {
    fn record_sample(&self, channel: &Channel, seconds: f64) {
        SampleSink::record_sample(&*self.metrics, channel, seconds);
    }
}

impl fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimizer")
            .field("monitoring", &self.is_monitoring())
            .field("settings", &self.settings())
            .field("intercepted", &self.intercepted_points())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::ManualClock;

    fn optimizer() -> (Rc<ManualClock>, Optimizer) {
        let clock = Rc::new(ManualClock::new(0.0));
        let optimizer = Optimizer::new(OptimizerConfig::default(), clock.clone()).unwrap();
        (clock, optimizer)
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let clock: Rc<dyn Clock> = Rc::new(ManualClock::new(0.0));
        let config = OptimizerConfig {
            cell_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Optimizer::new(config, clock),
            Err(OptimizerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_settings_propagate_to_structures() {
        let config = OptimizerConfig {
            settings: OptimizationSettings {
                caching: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let optimizer = Optimizer::new(config, Rc::new(ManualClock::new(0.0))).unwrap();
        assert_eq!(optimizer.cache_result("ns", 1u32, 7u32), Ok(7));
        assert_eq!(optimizer.cached_entries("ns"), 0);

        optimizer.set_optimization(Optimization::Caching, true);
        optimizer.cache_result("ns", 1u32, 7u32).unwrap();
        assert_eq!(optimizer.get_cached_result::<u32, u32>("ns", &1, None), Some(7));
    }

    #[test]
    fn test_set_optimization_by_name() {
        let (_clock, optimizer) = optimizer();
        optimizer.set_optimization_by_name("spatialHashing", false).unwrap();
        assert!(!optimizer.is_enabled(Optimization::SpatialHashing));
        assert!(optimizer.set_optimization_by_name("bloom", true).is_err());
    }

    #[test]
    fn test_time_records_into_channel() {
        let (clock, optimizer) = optimizer();
        optimizer.start_monitoring();
        let value = optimizer.time(Channel::subsystem("ai"), || {
            clock.advance(0.003);
            42
        });
        assert_eq!(value, 42);
        let metrics = optimizer.metrics();
        let series = metrics.series(&Channel::subsystem("ai")).unwrap();
        assert_eq!(series.len(), 1);
        assert!((series.latest().unwrap() - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_should_cull_requires_viewport_and_bounds() {
        let (_clock, optimizer) = optimizer();
        let offscreen = Some(Rect::new(1000.0, 1000.0, 10.0, 10.0));
        assert!(!optimizer.should_cull(offscreen));

        optimizer.set_viewport(Some(Rect::new(0.0, 0.0, 800.0, 600.0)));
        assert!(optimizer.should_cull(offscreen));
        assert!(!optimizer.should_cull(None));
        assert!(!optimizer.should_cull(Some(Rect::new(10.0, 10.0, 4.0, 4.0))));

        optimizer.set_optimization(Optimization::Culling, false);
        assert!(!optimizer.should_cull(offscreen));
    }

    #[test]
    fn test_intercept_rejects_duplicates_until_released() {
        let (_clock, optimizer) = optimizer();
        let first = optimizer.intercept("board", &["add_entity"]).unwrap();
        assert!(optimizer.is_intercepted("board.add_entity"));
        assert!(matches!(
            optimizer.intercept("board", &["add_entity"]),
            Err(OptimizerError::AlreadyIntercepted { .. })
        ));
        drop(first);
        assert!(optimizer.intercept("board", &["add_entity"]).is_ok());
    }

    #[test]
    fn test_pooled_factory_requires_initialized_pool() {
        let (_clock, optimizer) = optimizer();
        assert!(matches!(
            optimizer.pooled_factory::<u32>("missing"),
            Err(OptimizerError::UnknownPoolType { .. })
        ));
    }
}
