//! Engine: handle-based entry point the surrounding page uses.
//!
//! Owns the shared read-only [`DescriptorTable`], the asset resolver and the
//! journal publisher, and a registry of live devices keyed by [`DeviceId`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use homifi_domain::descriptor::DescriptorTable;
use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::error::{EngineError, NotFoundError};
use homifi_domain::event::{DeviceEvent, EventType};
use homifi_domain::id::DeviceId;
use homifi_domain::transition::TriggerSource;

use crate::device::Device;
use crate::lock;
use crate::ports::{AssetResolver, EventPublisher, MediaElement};
use crate::store::{DeviceSnapshot, Subscription};

/// Registry of simulated devices sharing one descriptor table.
pub struct Engine<R, M, P> {
    table: Arc<DescriptorTable>,
    resolver: Arc<R>,
    publisher: Arc<P>,
    devices: Mutex<HashMap<DeviceId, Arc<Device<R, M, P>>>>,
}

impl<R, M, P> Engine<R, M, P>
where
    R: AssetResolver + 'static,
    M: MediaElement + 'static,
    P: EventPublisher + 'static,
{
    #[must_use]
    pub fn new(table: DescriptorTable, resolver: Arc<R>, publisher: Arc<P>) -> Self {
        Self {
            table: Arc::new(table),
            resolver,
            publisher,
            devices: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn table(&self) -> &Arc<DescriptorTable> {
        &self.table
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    /// Create a device of `kind` in its default resting state.
    pub fn create_device(&self, kind: DeviceKind) -> DeviceId {
        self.register(kind, None)
    }

    /// Create a device whose clip-portrayed steps play on `media`.
    pub fn create_media_device(&self, kind: DeviceKind, media: Arc<M>) -> DeviceId {
        self.register(kind, Some(media))
    }

    /// Look up a live device.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no device with this id exists.
    pub fn device(&self, id: DeviceId) -> Result<Arc<Device<R, M, P>>, NotFoundError> {
        lock(&self.devices)
            .get(&id)
            .cloned()
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: id.to_string(),
            })
    }

    /// Ask device `id` for `target`. Unknown ids are rejected like any
    /// other request.
    pub fn request_transition(&self, id: DeviceId, target: DeviceState, source: TriggerSource) -> bool {
        self.try_request_transition(id, target, source).is_ok()
    }

    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown ids and
    /// [`EngineError::Transition`] when the device rejects the request.
    pub fn try_request_transition(
        &self,
        id: DeviceId,
        target: DeviceState,
        source: TriggerSource,
    ) -> Result<(), EngineError> {
        self.device(id)?.try_request_transition(target, source)?;
        Ok(())
    }

    /// Subscribe to committed changes of device `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no device with this id exists.
    pub fn subscribe<F>(&self, id: DeviceId, callback: F) -> Result<Subscription, NotFoundError>
    where
        F: Fn(&DeviceSnapshot) + Send + Sync + 'static,
    {
        Ok(self.device(id)?.subscribe(callback))
    }

    /// Tear down device `id` and forget it.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no device with this id exists.
    pub fn destroy(&self, id: DeviceId) -> Result<(), NotFoundError> {
        let device = lock(&self.devices).remove(&id).ok_or_else(|| NotFoundError {
            entity: "Device",
            id: id.to_string(),
        })?;
        device.destroy();
        Ok(())
    }

    /// Tear down every device.
    pub fn destroy_all(&self) {
        let devices: Vec<_> = lock(&self.devices).drain().map(|(_, device)| device).collect();
        for device in devices {
            device.destroy();
        }
    }

    /// Number of live devices.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.devices).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.devices).is_empty()
    }

    fn register(&self, kind: DeviceKind, media: Option<Arc<M>>) -> DeviceId {
        let device = Arc::new(Device::new(
            kind,
            Arc::clone(&self.table),
            Arc::clone(&self.resolver),
            Arc::clone(&self.publisher),
            media,
        ));
        let id = device.id();
        let state = device.state();
        lock(&self.devices).insert(id, device);

        tracing::info!(device_id = %id, %kind, %state, "device created");
        self.publisher.publish(DeviceEvent::new(
            EventType::DeviceCreated,
            id,
            serde_json::json!({ "kind": kind, "state": state.to_string() }),
        ));
        id
    }
}
