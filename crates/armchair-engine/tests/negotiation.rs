//! Drives the negotiator through a scripted backend; no GPU involved.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use armchair_engine::device::{
    AdapterCaps, DeviceRequest, Feature, FeatureRequests, GpuBackend, GpuFuture, LimitRequests,
    NegotiationError, NegotiationPhase, NegotiationRequest, Negotiator,
};

/// Completes after being polled `remaining` more times.
struct Delayed<T> {
    remaining: u32,
    value: Option<T>,
}

impl<T: Unpin> Future for Delayed<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if self.remaining > 0 {
            self.remaining -= 1;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        Poll::Ready(self.value.take().expect("polled after completion"))
    }
}

fn delayed<T: Unpin + 'static>(polls: u32, value: T) -> GpuFuture<T> {
    Box::pin(Delayed {
        remaining: polls,
        value: Some(value),
    })
}

#[derive(Clone)]
struct MockAdapter {
    features: wgpu::Features,
    limits: wgpu::Limits,
}

impl AdapterCaps for MockAdapter {
    fn features(&self) -> wgpu::Features {
        self.features
    }

    fn limits(&self) -> wgpu::Limits {
        self.limits.clone()
    }

    fn summary(&self) -> String {
        "mock adapter".into()
    }
}

#[derive(Debug, PartialEq)]
struct MockDevice {
    features: Vec<Feature>,
    max_texture_dimension_2d: u32,
}

struct MockBackend {
    adapter: Result<MockAdapter, String>,
    adapter_delay: u32,
    device_delay: u32,
    device_error: Option<String>,
    device_requests: Rc<Cell<u32>>,
    acquired: Rc<Cell<bool>>,
}

impl MockBackend {
    fn new(features: &[Feature]) -> Self {
        Self {
            adapter: Ok(MockAdapter {
                features: Feature::flags_of(features),
                limits: wgpu::Limits::default(),
            }),
            adapter_delay: 0,
            device_delay: 0,
            device_error: None,
            device_requests: Rc::new(Cell::new(0)),
            acquired: Rc::new(Cell::new(false)),
        }
    }
}

impl GpuBackend for MockBackend {
    type Adapter = MockAdapter;
    type Device = MockDevice;

    fn request_adapter(
        &mut self,
        _power_preference: wgpu::PowerPreference,
    ) -> GpuFuture<Result<MockAdapter, String>> {
        delayed(self.adapter_delay, self.adapter.clone())
    }

    fn request_device(
        &mut self,
        _adapter: &MockAdapter,
        request: &DeviceRequest,
    ) -> GpuFuture<Result<MockDevice, String>> {
        self.device_requests.set(self.device_requests.get() + 1);
        let result = match &self.device_error {
            Some(reason) => Err(reason.clone()),
            None => Ok(MockDevice {
                features: request.features.clone(),
                max_texture_dimension_2d: request.limits.max_texture_dimension_2d,
            }),
        };
        delayed(self.device_delay, result)
    }

    fn device_acquired(&mut self, _device: &MockDevice) {
        self.acquired.set(true);
    }
}

fn request(required: &[Feature], desired: &[Feature]) -> NegotiationRequest {
    NegotiationRequest {
        features: FeatureRequests {
            required: required.to_vec(),
            desired: desired.to_vec(),
        },
        limits: LimitRequests::new(),
        ..NegotiationRequest::permissive()
    }
}

#[test]
fn immediate_backend_is_ready_on_first_poll() {
    let backend = MockBackend::new(&[Feature::ShaderF16]);
    let acquired = backend.acquired.clone();
    let mut negotiator = Negotiator::new(backend, request(&[Feature::ShaderF16], &[]));

    assert_eq!(negotiator.phase(), NegotiationPhase::Uninitialized);
    let Poll::Ready(Ok(negotiated)) = negotiator.poll() else {
        panic!("expected a device on the first poll");
    };

    assert_eq!(negotiated.features, vec![Feature::ShaderF16]);
    assert_eq!(negotiated.device.features, vec![Feature::ShaderF16]);
    assert_eq!(negotiator.phase(), NegotiationPhase::DeviceReady);
    assert!(acquired.get());
}

#[test]
fn delayed_requests_report_pending_phases() {
    let mut backend = MockBackend::new(&[]);
    backend.adapter_delay = 2;
    backend.device_delay = 1;
    let mut negotiator = Negotiator::new(backend, request(&[], &[]));

    assert!(negotiator.poll().is_pending());
    assert_eq!(negotiator.phase(), NegotiationPhase::AdapterRequested);
    assert!(negotiator.poll().is_pending());
    assert_eq!(negotiator.phase(), NegotiationPhase::AdapterRequested);

    // Adapter completes, device request goes out and is pending once.
    assert!(negotiator.poll().is_pending());
    assert_eq!(negotiator.phase(), NegotiationPhase::DeviceRequested);

    assert!(matches!(negotiator.poll(), Poll::Ready(Ok(_))));
    assert_eq!(negotiator.phase(), NegotiationPhase::DeviceReady);
}

#[test]
fn missing_required_feature_fails_before_device_request() {
    let backend = MockBackend::new(&[Feature::ShaderF16, Feature::Float32Filterable]);
    let device_requests = backend.device_requests.clone();
    let mut negotiator = Negotiator::new(
        backend,
        request(&[Feature::TextureCompressionBc], &[Feature::ShaderF16]),
    );

    let Poll::Ready(Err(err)) = negotiator.poll() else {
        panic!("expected failure");
    };

    assert_eq!(
        err,
        NegotiationError::MissingFeature {
            feature: Feature::TextureCompressionBc
        }
    );
    assert!(err.to_string().contains("texture-compression-bc"));
    assert_eq!(device_requests.get(), 0);
    assert_eq!(negotiator.phase(), NegotiationPhase::Failed);

    // Failure is sticky.
    assert!(matches!(negotiator.poll(), Poll::Ready(Err(_))));
    assert_eq!(negotiator.error(), Some(&err));
}

#[test]
fn desired_features_follow_required_ones() {
    let backend = MockBackend::new(&[
        Feature::IndirectFirstInstance,
        Feature::ShaderF16,
        Feature::Depth32FloatStencil8,
    ]);
    let mut negotiator = Negotiator::new(
        backend,
        request(
            &[Feature::Depth32FloatStencil8, Feature::IndirectFirstInstance],
            &[Feature::Float32Filterable, Feature::ShaderF16],
        ),
    );

    let Poll::Ready(Ok(negotiated)) = negotiator.poll() else {
        panic!("expected a device");
    };
    assert_eq!(
        negotiated.features,
        vec![
            Feature::Depth32FloatStencil8,
            Feature::IndirectFirstInstance,
            Feature::ShaderF16,
        ]
    );
}

#[test]
fn unmet_limit_fails_before_device_request() {
    let mut backend = MockBackend::new(&[]);
    backend.adapter = Ok(MockAdapter {
        features: wgpu::Features::empty(),
        limits: wgpu::Limits {
            max_texture_dimension_2d: 2048,
            ..wgpu::Limits::default()
        },
    });
    let device_requests = backend.device_requests.clone();

    let mut req = request(&[], &[]);
    req.limits = LimitRequests::new().require("max_texture_dimension_2d", 3840);
    let mut negotiator = Negotiator::new(backend, req);

    let Poll::Ready(Err(err)) = negotiator.poll() else {
        panic!("expected failure");
    };
    assert_eq!(
        err,
        NegotiationError::LimitUnmet {
            name: "max_texture_dimension_2d",
            required: 3840,
            available: Some(2048),
        }
    );
    assert_eq!(device_requests.get(), 0);
}

#[test]
fn resolved_limits_reach_the_device_request() {
    let mut backend = MockBackend::new(&[]);
    backend.adapter = Ok(MockAdapter {
        features: wgpu::Features::empty(),
        limits: wgpu::Limits {
            max_texture_dimension_2d: 16384,
            ..wgpu::Limits::default()
        },
    });

    let mut req = request(&[], &[]);
    req.limits = LimitRequests::new()
        .require("max_texture_dimension_2d", 3840)
        .desire("max_texture_dimension_2d", 8192);
    let mut negotiator = Negotiator::new(backend, req);

    let Poll::Ready(Ok(negotiated)) = negotiator.poll() else {
        panic!("expected a device");
    };
    assert_eq!(negotiated.limits.max_texture_dimension_2d, 8192);
    assert_eq!(negotiated.device.max_texture_dimension_2d, 8192);
}

#[test]
fn adapter_and_device_errors_are_reported() {
    let mut backend = MockBackend::new(&[]);
    backend.adapter = Err("no adapter".into());
    let mut negotiator = Negotiator::new(backend, request(&[], &[]));
    let Poll::Ready(Err(err)) = negotiator.poll() else {
        panic!("expected failure");
    };
    assert_eq!(err, NegotiationError::AdapterUnavailable("no adapter".into()));

    let mut backend = MockBackend::new(&[]);
    backend.device_error = Some("device refused".into());
    let mut negotiator = Negotiator::new(backend, request(&[], &[]));
    let Poll::Ready(Err(err)) = negotiator.poll() else {
        panic!("expected failure");
    };
    assert_eq!(err, NegotiationError::DeviceRequestFailed("device refused".into()));
}

#[test]
fn pending_request_times_out() {
    let mut backend = MockBackend::new(&[]);
    backend.adapter_delay = u32::MAX;
    let mut req = request(&[], &[]);
    req.timeout = Duration::ZERO;
    let mut negotiator = Negotiator::new(backend, req);

    let Poll::Ready(Err(err)) = negotiator.poll() else {
        panic!("expected a timeout");
    };
    assert!(matches!(
        err,
        NegotiationError::TimedOut {
            phase: NegotiationPhase::AdapterRequested,
            ..
        }
    ));
    assert_eq!(negotiator.phase(), NegotiationPhase::Failed);
}

#[test]
fn finish_blocking_drives_delayed_futures() {
    let mut backend = MockBackend::new(&[]);
    backend.adapter_delay = 3;
    backend.device_delay = 3;
    let mut negotiator = Negotiator::new(backend, request(&[], &[]));

    assert!(negotiator.finish_blocking().is_ok());
    assert_eq!(negotiator.phase(), NegotiationPhase::DeviceReady);
}
