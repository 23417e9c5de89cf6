//! The worker pool: channels in, channels out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use tellus_config::TellusConfig;
use tellus_geodesy::{Ellipsoid, GeoExtent};
use tellus_geometry::{Geometry, PrimitiveTopology};
use tellus_pipeline::{tipsify, wrap_longitude};
use tellus_tessellate::{TessellationOptions, tessellate_extent};
use tracing::{debug, info, warn};

use crate::wire::{GeometryPayload, TessellationRequest, TessellationResponse};

/// A pool of tessellation workers fed over bounded channels.
///
/// Each worker thread processes one request at a time, start to finish, so
/// no scratch state is ever shared between computations. Responses arrive
/// in completion order, not submission order; callers correlate by id.
/// Dropping the service shuts the pool down gracefully.
pub struct TessellationService {
    request_sender: Option<crossbeam_channel::Sender<TessellationRequest>>,
    response_receiver: crossbeam_channel::Receiver<TessellationResponse>,
    worker_handles: Vec<JoinHandle<()>>,
    budget: usize,
    in_flight: Arc<AtomicUsize>,
}

impl TessellationService {
    /// Spawns the worker pool described by `config`.
    ///
    /// A `worker_count` of zero derives the pool size from the CPU count,
    /// leaving one core for the caller.
    #[must_use]
    pub fn new(config: &TellusConfig) -> Self {
        let worker_count = if config.worker.worker_count == 0 {
            num_cpus::get().saturating_sub(1).max(1)
        } else {
            config.worker.worker_count
        };
        let budget = config.worker.queue_capacity;

        let (request_tx, request_rx) = crossbeam_channel::bounded(budget);
        let (response_tx, response_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let optimize = config.optimization.optimize_vertex_cache;
        let cache_size = config.optimization.cache_size;

        let mut handles = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let rx: crossbeam_channel::Receiver<TessellationRequest> = request_rx.clone();
            let tx = response_tx.clone();
            let flight = Arc::clone(&in_flight);

            let handle = std::thread::Builder::new()
                .name(format!("tellus-worker-{worker}"))
                .spawn(move || {
                    while let Ok(request) = rx.recv() {
                        let response = process_request(request, optimize, cache_size);
                        let _ = tx.send(response);
                        flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }

        info!(worker_count, budget, "tessellation service started");

        Self {
            request_sender: Some(request_tx),
            response_receiver: response_rx,
            worker_handles: handles,
            budget,
            in_flight,
        }
    }

    /// Submits a request. Returns `false` when the budget is exhausted or
    /// the service has shut down; the request is dropped in that case.
    pub fn submit(&self, request: TessellationRequest) -> bool {
        let Some(sender) = &self.request_sender else {
            return false;
        };
        if self.in_flight.load(Ordering::Relaxed) >= self.budget {
            return false;
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(request).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Drains every completed response without blocking.
    #[must_use]
    pub fn drain_responses(&self) -> Vec<TessellationResponse> {
        let mut responses = Vec::new();
        while let Ok(response) = self.response_receiver.try_recv() {
            responses.push(response);
        }
        responses
    }

    /// Number of requests queued or running.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Shuts down the pool: closes the request channel and joins every
    /// worker. In-flight requests finish first; their responses stay
    /// drainable.
    pub fn shutdown(&mut self) {
        self.request_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for TessellationService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs one request start to finish and packages the outcome.
///
/// Any precondition violation becomes the error arm of the response with a
/// human-readable message; the pool itself never fails.
fn process_request(
    request: TessellationRequest,
    optimize: bool,
    cache_size: usize,
) -> TessellationResponse {
    let id = request.id;
    let result = run_pipeline(request, optimize, cache_size);
    if let Err(message) = &result {
        warn!(id, message, "tessellation request failed");
    }
    TessellationResponse { id, result }
}

fn run_pipeline(
    request: TessellationRequest,
    optimize: bool,
    cache_size: usize,
) -> Result<GeometryPayload, String> {
    let parameters = request.parameters;

    let [x, y, z] = parameters.ellipsoid_radii;
    let ellipsoid = Ellipsoid::new(x, y, z).map_err(|error| error.to_string())?;

    let options = TessellationOptions {
        extent: GeoExtent::new(
            parameters.extent.west,
            parameters.extent.south,
            parameters.extent.east,
            parameters.extent.north,
        ),
        ellipsoid,
        granularity: parameters.granularity,
        height: parameters.height,
        extruded_height: parameters.extruded_height,
        rotation: parameters.rotation,
        st_rotation: parameters.st_rotation,
        vertex_format: parameters.vertex_format.into(),
        close_top: parameters.close_top,
        close_bottom: parameters.close_bottom,
    };

    let geometry = tessellate_extent(&options).map_err(|error| error.to_string())?;
    let geometry = wrap_longitude(geometry).map_err(|error| error.to_string())?;
    let geometry = maybe_optimize(geometry, optimize, cache_size)?;

    debug!(
        id = request.id,
        vertices = geometry.vertex_count(),
        "tessellation complete"
    );
    Ok(geometry.into())
}

/// Optional vertex-cache pass over triangle output.
fn maybe_optimize(
    mut geometry: Geometry,
    optimize: bool,
    cache_size: usize,
) -> Result<Geometry, String> {
    if !optimize || geometry.primitive_topology != PrimitiveTopology::Triangles {
        return Ok(geometry);
    }
    let Some(indices) = geometry.indices.take() else {
        return Ok(geometry);
    };
    let reordered = tipsify(&indices, None, cache_size).map_err(|error| error.to_string())?;
    geometry.indices = Some(reordered);
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ExtentParameters, TessellationParameters, VertexFormatFlags};
    use std::time::{Duration, Instant};

    fn request(id: u64) -> TessellationRequest {
        TessellationRequest {
            id,
            parameters: TessellationParameters {
                extent: ExtentParameters {
                    west: (-10.0_f64).to_radians(),
                    south: (-10.0_f64).to_radians(),
                    east: 10.0_f64.to_radians(),
                    north: 10.0_f64.to_radians(),
                },
                ellipsoid_radii: [1.0, 1.0, 1.0],
                granularity: 10.0_f64.to_radians(),
                height: 0.0,
                extruded_height: None,
                rotation: 0.0,
                st_rotation: 0.0,
                close_top: true,
                close_bottom: true,
                vertex_format: VertexFormatFlags {
                    position: true,
                    normal: true,
                    st: true,
                    tangent: false,
                    binormal: false,
                },
            },
        }
    }

    fn wait_for_responses(service: &TessellationService, count: usize) -> Vec<TessellationResponse> {
        let start = Instant::now();
        let mut responses = Vec::new();
        while responses.len() < count {
            responses.extend(service.drain_responses());
            assert!(
                start.elapsed().as_secs() < 10,
                "timed out waiting for responses"
            );
            std::thread::sleep(Duration::from_millis(1));
        }
        responses
    }

    #[test]
    fn test_request_produces_geometry_with_echoed_id() {
        let service = TessellationService::new(&TellusConfig::default());
        assert!(service.submit(request(42)));

        let responses = wait_for_responses(&service, 1);
        assert_eq!(responses[0].id, 42);
        let payload = responses[0].result.as_ref().expect("success");
        let position = &payload.attributes["position"];
        assert_eq!(position.components_per_attribute, 3);
        match &position.values {
            crate::wire::WireBuffer::F64(values) => assert_eq!(values.len(), 27),
            other => panic!("positions should be f64, got {other:?}"),
        }
        assert_eq!(payload.indices.as_ref().unwrap().len(), 24);
        assert!(payload.bounding_sphere.is_some());
    }

    #[test]
    fn test_invalid_request_reports_error_not_panic() {
        let service = TessellationService::new(&TellusConfig::default());
        let mut bad = request(9);
        bad.parameters.granularity = 0.0;
        assert!(service.submit(bad));

        let responses = wait_for_responses(&service, 1);
        assert_eq!(responses[0].id, 9);
        let error = responses[0].result.as_ref().expect_err("failure expected");
        assert!(error.contains("granularity"), "unhelpful message: {error}");
    }

    #[test]
    fn test_negative_radii_reported_as_error() {
        let service = TessellationService::new(&TellusConfig::default());
        let mut bad = request(1);
        bad.parameters.ellipsoid_radii = [-1.0, 1.0, 1.0];
        assert!(service.submit(bad));
        let responses = wait_for_responses(&service, 1);
        assert!(responses[0].result.is_err());
    }

    #[test]
    fn test_many_requests_all_answered_with_matching_ids() {
        let mut config = TellusConfig::default();
        config.worker.worker_count = 4;
        let service = TessellationService::new(&config);

        let ids: Vec<u64> = (0..8).collect();
        for &id in &ids {
            assert!(service.submit(request(id)));
        }

        let responses = wait_for_responses(&service, ids.len());
        let mut answered: Vec<u64> = responses.iter().map(|r| r.id).collect();
        answered.sort_unstable();
        assert_eq!(answered, ids);
    }

    /// A request big enough that the single worker cannot drain the queue
    /// while the test is still submitting.
    fn heavy_request(id: u64) -> TessellationRequest {
        let mut request = request(id);
        request.parameters.extent = ExtentParameters {
            west: (-40.0_f64).to_radians(),
            south: (-40.0_f64).to_radians(),
            east: 40.0_f64.to_radians(),
            north: 40.0_f64.to_radians(),
        };
        request.parameters.granularity = 0.1_f64.to_radians();
        request
    }

    #[test]
    fn test_budget_limits_submissions() {
        let mut config = TellusConfig::default();
        config.worker.worker_count = 1;
        config.worker.queue_capacity = 2;
        let service = TessellationService::new(&config);

        let mut accepted = 0;
        for id in 0..20 {
            if service.submit(heavy_request(id)) {
                accepted += 1;
            }
        }
        assert!(accepted <= 4, "budget should cap submissions, got {accepted}");
    }

    #[test]
    fn test_optimized_output_preserves_triangles() {
        let mut config = TellusConfig::default();
        config.optimization.optimize_vertex_cache = true;
        let service = TessellationService::new(&config);
        assert!(service.submit(request(5)));

        let responses = wait_for_responses(&service, 1);
        let payload = responses[0].result.as_ref().expect("success");
        let indices = payload.indices.as_ref().unwrap();
        assert_eq!(indices.len(), 24, "triangle count unchanged");
        assert!(indices.iter().all(|&i| i < 9));
    }

    #[test]
    fn test_shutdown_finishes_in_flight_work() {
        let mut service = TessellationService::new(&TellusConfig::default());
        assert!(service.submit(request(77)));
        service.shutdown();
        let responses = service.drain_responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, 77);
    }
}
