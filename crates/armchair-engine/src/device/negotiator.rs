//! Adapter/device handshake as an explicitly polled state machine.
//!
//! ```text
//! Uninitialized -> AdapterRequested -> AdapterAcquired -> DeviceRequested -> DeviceReady
//!        \               \                  \                  \
//!         `---------------`------------------`------------------`--> Failed
//! ```
//!
//! The host calls [`Negotiator::poll`] once per tick. Each call advances through
//! as many states as it can without blocking and returns `Pending` while a
//! request is outstanding.

use std::future::poll_fn;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use super::backend::{AdapterCaps, DeviceRequest, GpuBackend, GpuFuture};
use super::error::NegotiationError;
use super::features::{Feature, resolve_features};
use super::init::NegotiationRequest;
use super::limits::resolve_limits;

/// Observable negotiation state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NegotiationPhase {
    Uninitialized,
    AdapterRequested,
    AdapterAcquired,
    DeviceRequested,
    DeviceReady,
    Failed,
}

/// Result of a successful negotiation.
pub struct NegotiatedDevice<B: GpuBackend> {
    pub adapter: B::Adapter,
    pub device: B::Device,
    /// Features enabled on the device, required ones first.
    pub features: Vec<Feature>,
    /// Limits the device was created with.
    pub limits: wgpu::Limits,
}

enum State<B: GpuBackend> {
    Uninitialized,
    AdapterRequested {
        pending: GpuFuture<Result<B::Adapter, String>>,
    },
    AdapterAcquired {
        adapter: B::Adapter,
    },
    DeviceRequested {
        adapter: B::Adapter,
        request: DeviceRequest,
        pending: GpuFuture<Result<B::Device, String>>,
    },
    DeviceReady,
    Failed(NegotiationError),
}

impl<B: GpuBackend> State<B> {
    fn phase(&self) -> NegotiationPhase {
        match self {
            State::Uninitialized => NegotiationPhase::Uninitialized,
            State::AdapterRequested { .. } => NegotiationPhase::AdapterRequested,
            State::AdapterAcquired { .. } => NegotiationPhase::AdapterAcquired,
            State::DeviceRequested { .. } => NegotiationPhase::DeviceRequested,
            State::DeviceReady => NegotiationPhase::DeviceReady,
            State::Failed(_) => NegotiationPhase::Failed,
        }
    }
}

/// Drives a [`GpuBackend`] from nothing to a ready device.
pub struct Negotiator<B: GpuBackend> {
    backend: B,
    request: NegotiationRequest,
    state: State<B>,
    started: Option<Instant>,
}

impl<B: GpuBackend> Negotiator<B> {
    pub fn new(backend: B, request: NegotiationRequest) -> Self {
        Self {
            backend,
            request,
            state: State::Uninitialized,
            started: None,
        }
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.state.phase()
    }

    /// The failure reason once in the `Failed` phase.
    pub fn error(&self) -> Option<&NegotiationError> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Time since the first poll.
    pub fn elapsed(&self) -> Duration {
        self.started.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Advances negotiation without blocking.
    ///
    /// Returns the device exactly once. A failed negotiation keeps returning its
    /// error; polling after the device was handed out returns `Pending`.
    pub fn poll(&mut self) -> Poll<Result<NegotiatedDevice<B>, NegotiationError>> {
        let mut cx = Context::from_waker(Waker::noop());
        self.poll_with(&mut cx)
    }

    /// Blocks the calling thread until negotiation finishes.
    ///
    /// The timeout is only checked when a request future yields, so a backend
    /// whose futures never wake will block indefinitely here.
    pub fn finish_blocking(&mut self) -> Result<NegotiatedDevice<B>, NegotiationError> {
        pollster::block_on(poll_fn(|cx| self.poll_with(cx)))
    }

    fn poll_with(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<NegotiatedDevice<B>, NegotiationError>> {
        loop {
            let state = std::mem::replace(&mut self.state, State::DeviceReady);

            self.state = match state {
                State::Uninitialized => {
                    self.started = Some(Instant::now());
                    log::info!(
                        "requesting GPU adapter ({:?})",
                        self.request.power_preference
                    );
                    State::AdapterRequested {
                        pending: self.backend.request_adapter(self.request.power_preference),
                    }
                }

                State::AdapterRequested { mut pending } => match pending.as_mut().poll(cx) {
                    Poll::Pending => {
                        self.state = State::AdapterRequested { pending };
                        return self.pending_or_timeout(NegotiationPhase::AdapterRequested);
                    }
                    Poll::Ready(Ok(adapter)) => {
                        log::info!("GPU adapter acquired: {}", adapter.summary());
                        State::AdapterAcquired { adapter }
                    }
                    Poll::Ready(Err(reason)) => {
                        self.fail(NegotiationError::AdapterUnavailable(reason))
                    }
                },

                State::AdapterAcquired { adapter } => match self.device_request_for(&adapter) {
                    Ok(request) => {
                        log::info!("requesting GPU device");
                        let pending = self.backend.request_device(&adapter, &request);
                        State::DeviceRequested {
                            adapter,
                            request,
                            pending,
                        }
                    }
                    Err(err) => self.fail(err),
                },

                State::DeviceRequested {
                    adapter,
                    request,
                    mut pending,
                } => match pending.as_mut().poll(cx) {
                    Poll::Pending => {
                        self.state = State::DeviceRequested {
                            adapter,
                            request,
                            pending,
                        };
                        return self.pending_or_timeout(NegotiationPhase::DeviceRequested);
                    }
                    Poll::Ready(Ok(device)) => {
                        self.backend.device_acquired(&device);
                        log::info!(
                            "GPU device ready after {:.0} ms",
                            self.elapsed().as_secs_f64() * 1000.0
                        );
                        self.state = State::DeviceReady;
                        return Poll::Ready(Ok(NegotiatedDevice {
                            adapter,
                            device,
                            features: request.features,
                            limits: request.limits,
                        }));
                    }
                    Poll::Ready(Err(reason)) => {
                        self.fail(NegotiationError::DeviceRequestFailed(reason))
                    }
                },

                State::DeviceReady => {
                    log::warn!("negotiator polled after the device was handed out");
                    self.state = State::DeviceReady;
                    return Poll::Pending;
                }

                State::Failed(err) => {
                    self.state = State::Failed(err.clone());
                    return Poll::Ready(Err(err));
                }
            };
        }
    }

    fn device_request_for(&self, adapter: &B::Adapter) -> Result<DeviceRequest, NegotiationError> {
        let available = Feature::set_from(adapter.features());
        for feature in &available {
            log::debug!("adapter feature: {feature}");
        }

        let features = resolve_features(&available, &self.request.features)?;
        let limits = resolve_limits(
            &self.request.limits,
            &adapter.limits(),
            self.request.base_limits.clone(),
        )?;

        Ok(DeviceRequest {
            label: "armchair device",
            features,
            limits,
        })
    }

    fn pending_or_timeout(
        &mut self,
        phase: NegotiationPhase,
    ) -> Poll<Result<NegotiatedDevice<B>, NegotiationError>> {
        let elapsed = self.elapsed();
        if elapsed < self.request.timeout {
            return Poll::Pending;
        }

        let err = NegotiationError::TimedOut { phase, elapsed };
        self.state = self.fail(err.clone());
        Poll::Ready(Err(err))
    }

    fn fail(&self, err: NegotiationError) -> State<B> {
        log::error!("GPU negotiation failed: {err}");
        State::Failed(err)
    }
}
