//! Implements the capability seam on top of the `hidapi` crate.
//!
//! The element snapshot is derived from the device's HID report descriptor:
//! every input field gets a cookie equal to its 1-based position across the
//! descriptor's input reports, which is stable for a given device and
//! firmware revision but meaningless beyond it. A reader thread bridges raw
//! input reports into the bounded event queue, synthesizing press and
//! release edges from value changes of the watched elements.

use std::{collections::HashMap, io, ops::Range, thread};

use hidapi::{HidApi, HidDevice, MAX_REPORT_DESCRIPTOR_SIZE};
use hidreport::{Field, Report, ReportDescriptor};
use irhid::{
    capability::{DeviceCapability, HidHost, OsError},
    element::{Element, ElementCookie},
    queue::{Event, EventQueue, EventSender},
};
use itertools::Itertools;
use log::{debug, warn};

/// How long a blocking read waits before checking whether the consumer side
/// of the queue is still there.
const READ_TIMEOUT_MS: i32 = 250;

/// Input reports of the remote are a handful of bytes; this is generous.
const MAX_INPUT_REPORT_LENGTH: usize = 64;

/// The host HID registry, queried through hidapi.
pub struct HidapiHost {
    api: HidApi,
}

impl HidapiHost {
    /// Initializes the host HID subsystem.
    pub fn new() -> Result<Self, OsError> {
        Ok(Self {
            api: HidApi::new()?,
        })
    }
}

impl HidHost for HidapiHost {
    type Capability = HidapiDevice;

    fn locate(&self, name: &str) -> Result<Option<HidapiDevice>, OsError> {
        // hidapi lists one entry per usage of every device. Deduplicate by
        // path, keeping enumeration order, and take the first name match.
        for info in self.api.device_list().unique_by(|info| info.path()) {
            if info.product_string() != Some(name) {
                continue;
            }

            debug!(
                "matched {:04x}:{:04x} at {:?}",
                info.vendor_id(),
                info.product_id(),
                info.path()
            );
            let device = self.api.open_path(info.path())?;
            return Ok(Some(HidapiDevice::new(device)));
        }

        Ok(None)
    }
}

/// One opened remote, with its parsed report descriptor.
pub struct HidapiDevice {
    device: Option<HidDevice>,
    descriptor: Option<ReportDescriptor>,
    elements: Vec<Element>,
}

impl HidapiDevice {
    fn new(device: HidDevice) -> Self {
        Self {
            device: Some(device),
            descriptor: None,
            elements: Vec::new(),
        }
    }

    fn device(&self) -> Result<&HidDevice, OsError> {
        self.device
            .as_ref()
            .ok_or_else(|| io::Error::other("the device is no longer held").into())
    }
}

impl DeviceCapability for HidapiDevice {
    fn open(&mut self) -> Result<(), OsError> {
        // hidapi opens the transport when the path is opened; what remains
        // is pinning the handle to blocking reads for the reader thread.
        self.device()?.set_blocking_mode(true)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), OsError> {
        // The transport handle lives with the reader thread once watching
        // has started and is released when delivery stops; closing here
        // only drops whatever is still held.
        self.device.take();
        self.descriptor.take();
        Ok(())
    }

    fn elements(&mut self) -> Result<Vec<Element>, OsError> {
        let mut raw = vec![0u8; MAX_REPORT_DESCRIPTOR_SIZE];
        let len = self.device()?.get_report_descriptor(&mut raw)?;
        let descriptor = ReportDescriptor::try_from(&raw[..len])?;

        self.elements = snapshot_elements(&descriptor);
        self.descriptor = Some(descriptor);
        debug!("snapshotted {} input elements", self.elements.len());

        Ok(self.elements.clone())
    }

    fn watch(
        &mut self,
        cookies: [ElementCookie; 6],
        depth: usize,
    ) -> Result<EventQueue, OsError> {
        let descriptor = self
            .descriptor
            .take()
            .ok_or_else(|| io::Error::other("elements were never enumerated"))?;
        let device = self
            .device
            .take()
            .ok_or_else(|| io::Error::other("the device is no longer held"))?;

        // Absent cookies are registered like any other; they match no
        // element and therefore never fire.
        let watched = watched_elements(&self.elements, &cookies);
        debug!("watching {watched:?}");

        // The queue exists before the reader delivers anything, so no early
        // event can be missed.
        let (sender, queue) = EventQueue::bounded(depth);
        thread::Builder::new()
            .name("ir-events".into())
            .spawn(move || pump(device, descriptor, watched, sender))?;

        Ok(queue)
    }
}

/// One watched element, resolved back to the usage its report field carries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct WatchedElement {
    cookie: ElementCookie,
    usage_page: u16,
    usage: u16,
}

/// Assigns cookies to the descriptor's input fields in enumeration order.
///
/// Padding and array fields carry no single usage; their attributes stay
/// unset and the resolver skips them.
fn snapshot_elements(descriptor: &ReportDescriptor) -> Vec<Element> {
    let mut elements = Vec::new();

    for report in descriptor.input_reports() {
        for field in report.fields() {
            let cookie = ElementCookie(elements.len() as u32 + 1);
            let element = match field {
                Field::Variable(var) => Element::new(
                    cookie,
                    u16::from(var.usage.usage_page),
                    u16::from(var.usage.usage_id),
                ),
                _ => Element {
                    cookie: Some(cookie),
                    usage: None,
                    usage_page: None,
                },
            };
            elements.push(element);
        }
    }

    elements
}

/// Maps the registered cookies back to their elements' usages, dropping the
/// absent ones and any cookie that matches no snapshotted element.
fn watched_elements(elements: &[Element], cookies: &[ElementCookie; 6]) -> Vec<WatchedElement> {
    cookies
        .iter()
        .filter_map(|cookie| {
            elements
                .iter()
                .find(|element| element.cookie == Some(*cookie))
                .and_then(|element| {
                    Some(WatchedElement {
                        cookie: *cookie,
                        usage_page: element.usage_page?,
                        usage: element.usage?,
                    })
                })
        })
        .collect()
}

/// The reader thread: bridges input reports into the event queue until the
/// consumer goes away or the device read fails.
fn pump(
    device: HidDevice,
    descriptor: ReportDescriptor,
    watched: Vec<WatchedElement>,
    sender: EventSender,
) {
    // Buttons start released.
    let mut state: HashMap<u32, u32> =
        watched.iter().map(|element| (element.cookie.0, 0)).collect();
    let mut buf = [0u8; MAX_INPUT_REPORT_LENGTH];

    loop {
        let len = match device.read_timeout(&mut buf, READ_TIMEOUT_MS) {
            Ok(0) => {
                if !sender.is_live() {
                    return;
                }
                continue;
            }
            Ok(len) => len,
            Err(err) => {
                warn!("device read failed, stopping event delivery: {err}");
                return;
            }
        };

        decode_report(&descriptor, &watched, &buf[..len], &mut state, &sender);

        if !sender.is_live() {
            return;
        }
    }
}

/// Decodes one input report and offers an event for every watched element
/// whose value changed.
fn decode_report(
    descriptor: &ReportDescriptor,
    watched: &[WatchedElement],
    data: &[u8],
    state: &mut HashMap<u32, u32>,
    sender: &EventSender,
) {
    let Some(report) = descriptor.find_input_report(data) else {
        return;
    };

    for field in report.fields() {
        let Field::Variable(var) = field else {
            continue;
        };

        let usage_page = u16::from(var.usage.usage_page);
        let usage = u16::from(var.usage.usage_id);
        let Some(element) = watched
            .iter()
            .find(|element| element.usage_page == usage_page && element.usage == usage)
        else {
            continue;
        };

        let value = extract_bits(data, var.bits.clone());
        let last = state.entry(element.cookie.0).or_insert(0);
        if *last != value {
            *last = value;
            sender.offer(Event {
                cookie: element.cookie,
                value: value as i32,
            });
        }
    }
}

/// Extracts an unsigned little-endian field value from a report.
///
/// Field bit ranges span the whole report as read from the device, report
/// ID byte included when the device numbers its reports.
fn extract_bits(payload: &[u8], bits: Range<usize>) -> u32 {
    let mut value = 0u32;

    for (i, bit) in bits.enumerate().take(u32::BITS as usize) {
        let byte = bit / 8;
        if byte >= payload.len() {
            break;
        }
        if payload[byte] >> (bit % 8) & 1 == 1 {
            value |= 1 << i;
        }
    }

    value
}

#[cfg(test)]
mod tests {
    use irhid::{
        button::{Button, ButtonMap},
        element::GENERIC_DESKTOP_PAGE,
        queue::QUEUE_DEPTH,
    };

    use super::*;

    /// A descriptor shaped like the remote's: six 1-bit system menu buttons
    /// on the Generic Desktop page plus two bits of padding, no report IDs.
    #[rustfmt::skip]
    const REMOTE_DESCRIPTOR: &[u8] = &[
        0x05, 0x01,       // Usage Page (Generic Desktop)
        0x09, 0x80,       // Usage (System Control)
        0xa1, 0x01,       // Collection (Application)
        0x09, 0x85,       //   Usage (System App Menu)
        0x09, 0x86,       //   Usage (System Menu)
        0x09, 0x87,       //   Usage (System Menu Right)
        0x09, 0x88,       //   Usage (System Menu Left)
        0x09, 0x89,       //   Usage (System Menu Up)
        0x09, 0x8a,       //   Usage (System Menu Down)
        0x15, 0x00,       //   Logical Minimum (0)
        0x25, 0x01,       //   Logical Maximum (1)
        0x75, 0x01,       //   Report Size (1)
        0x95, 0x06,       //   Report Count (6)
        0x81, 0x02,       //   Input (Data, Variable, Absolute)
        0x75, 0x01,       //   Report Size (1)
        0x95, 0x02,       //   Report Count (2)
        0x81, 0x01,       //   Input (Constant)
        0xc0,             // End Collection
    ];

    /// The same layout with a numbered input report: field bit ranges then
    /// start after the report ID byte.
    #[rustfmt::skip]
    const NUMBERED_DESCRIPTOR: &[u8] = &[
        0x05, 0x01,       // Usage Page (Generic Desktop)
        0x09, 0x80,       // Usage (System Control)
        0xa1, 0x01,       // Collection (Application)
        0x85, 0x01,       //   Report ID (1)
        0x09, 0x85,       //   Usage (System App Menu)
        0x09, 0x86,       //   Usage (System Menu)
        0x09, 0x87,       //   Usage (System Menu Right)
        0x09, 0x88,       //   Usage (System Menu Left)
        0x09, 0x89,       //   Usage (System Menu Up)
        0x09, 0x8a,       //   Usage (System Menu Down)
        0x15, 0x00,       //   Logical Minimum (0)
        0x25, 0x01,       //   Logical Maximum (1)
        0x75, 0x01,       //   Report Size (1)
        0x95, 0x06,       //   Report Count (6)
        0x81, 0x02,       //   Input (Data, Variable, Absolute)
        0x75, 0x01,       //   Report Size (1)
        0x95, 0x02,       //   Report Count (2)
        0x81, 0x01,       //   Input (Constant)
        0xc0,             // End Collection
    ];

    fn descriptor() -> ReportDescriptor {
        ReportDescriptor::try_from(REMOTE_DESCRIPTOR).unwrap()
    }

    fn watched(descriptor: &ReportDescriptor) -> Vec<WatchedElement> {
        let elements = snapshot_elements(descriptor);
        let map = ButtonMap::resolve(&elements);
        watched_elements(&elements, &map.watched())
    }

    #[test]
    fn snapshot_assigns_cookies_to_every_button() {
        let elements = snapshot_elements(&descriptor());

        let buttons: Vec<&Element> = elements
            .iter()
            .filter(|element| element.usage.is_some())
            .collect();
        assert_eq!(buttons.len(), 6);

        for (element, button) in buttons.iter().zip(Button::ALL) {
            assert_eq!(element.usage_page, Some(GENERIC_DESKTOP_PAGE));
            assert_eq!(element.usage, Some(button as u16));
            assert!(!element.cookie.unwrap().is_absent());
        }
    }

    #[test]
    fn snapshot_resolves_to_a_full_button_map() {
        let elements = snapshot_elements(&descriptor());
        let map = ButtonMap::resolve(&elements);

        for button in Button::ALL {
            assert!(!map.cookie(button).is_absent());
        }
    }

    #[test]
    fn watched_elements_drop_absent_cookies() {
        let descriptor = descriptor();
        let elements = snapshot_elements(&descriptor);
        let all_absent = [ElementCookie::ABSENT; 6];

        assert!(watched_elements(&elements, &all_absent).is_empty());
        assert_eq!(watched(&descriptor).len(), 6);
    }

    #[test]
    fn decode_emits_press_and_release_edges() {
        let descriptor = descriptor();
        let watched = watched(&descriptor);
        let right = watched
            .iter()
            .find(|element| element.usage == Button::Right as u16)
            .unwrap()
            .cookie;

        let (sender, queue) = EventQueue::bounded(QUEUE_DEPTH);
        let mut state = HashMap::new();

        // Bit 2 is System Menu Right: press, repeat, release.
        decode_report(&descriptor, &watched, &[0b0000_0100], &mut state, &sender);
        decode_report(&descriptor, &watched, &[0b0000_0100], &mut state, &sender);
        decode_report(&descriptor, &watched, &[0b0000_0000], &mut state, &sender);

        let mut events = Vec::new();
        while let Some(event) = queue.poll() {
            events.push(event);
        }
        assert_eq!(
            events,
            [
                Event {
                    cookie: right,
                    value: 1
                },
                Event {
                    cookie: right,
                    value: 0
                },
            ]
        );
    }

    #[test]
    fn decode_handles_numbered_reports() {
        let descriptor = ReportDescriptor::try_from(NUMBERED_DESCRIPTOR).unwrap();
        let watched = watched(&descriptor);
        let right = watched
            .iter()
            .find(|element| element.usage == Button::Right as u16)
            .unwrap()
            .cookie;

        let (sender, queue) = EventQueue::bounded(QUEUE_DEPTH);
        let mut state = HashMap::new();

        // Right press and release, prefixed by the report ID byte.
        decode_report(
            &descriptor,
            &watched,
            &[0x01, 0b0000_0100],
            &mut state,
            &sender,
        );
        decode_report(&descriptor, &watched, &[0x01, 0x00], &mut state, &sender);

        let mut events = Vec::new();
        while let Some(event) = queue.poll() {
            events.push(event);
        }
        assert_eq!(
            events,
            [
                Event {
                    cookie: right,
                    value: 1
                },
                Event {
                    cookie: right,
                    value: 0
                },
            ]
        );
    }

    #[test]
    fn extract_bits_reads_little_endian_fields() {
        assert_eq!(extract_bits(&[0b0000_0100], 2..3), 1);
        assert_eq!(extract_bits(&[0b0000_0010], 2..3), 0);
        assert_eq!(extract_bits(&[0xff, 0x01], 4..12), 0x1f);
        // Out-of-range bits read as zero.
        assert_eq!(extract_bits(&[0xff], 6..10), 0b11);
    }
}
