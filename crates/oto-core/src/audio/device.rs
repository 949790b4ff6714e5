//! Output device enumeration and lookup
//!
//! Devices are listed from every available cpal host, so on Linux both the
//! JACK/PulseAudio pseudo-devices and the raw ALSA hardware devices show up.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Sample rates reported to the user when a device supports them
const COMMON_SAMPLE_RATES: [u32; 6] = [44100, 48000, 88200, 96000, 176400, 192000];

fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

fn host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|&id| host_name(id) == name)
        .and_then(|id| cpal::host_from_id(id).ok())
}

/// An output device as shown in a device list
#[derive(Debug, Clone)]
pub struct OutputDevice {
    pub id: DeviceId,
    pub name: String,
    pub host: String,
    /// System default for its host
    pub is_default: bool,
    pub sample_rates: Vec<u32>,
    pub max_channels: u16,
}

impl std::fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.host, self.name)?;
        if self.is_default {
            write!(f, " (default)")?;
        }
        Ok(())
    }
}

/// List output devices from all hosts, defaults first
pub fn get_output_devices() -> AudioResult<Vec<OutputDevice>> {
    let mut devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_label = host_name(host_id);
        let default_name = host.default_output_device().and_then(|d| d.name().ok());

        let outputs = match host.output_devices() {
            Ok(d) => d,
            Err(e) => {
                log::debug!("Could not enumerate devices for {:?}: {}", host_id, e);
                continue;
            }
        };

        for device in outputs {
            let Ok(name) = device.name() else { continue };
            let Ok(configs) = device.supported_output_configs() else { continue };
            let configs: Vec<_> = configs.collect();
            if configs.is_empty() {
                continue;
            }

            let max_channels = configs.iter().map(|c| c.channels()).max().unwrap_or(0);
            let sample_rates = COMMON_SAMPLE_RATES
                .into_iter()
                .filter(|&rate| {
                    configs
                        .iter()
                        .any(|c| rate >= c.min_sample_rate().0 && rate <= c.max_sample_rate().0)
                })
                .collect();

            devices.push(OutputDevice {
                id: DeviceId::with_host(name.clone(), host_label.clone()),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                host: host_label.clone(),
                sample_rates,
                max_channels,
            });
        }
    }

    if devices.is_empty() {
        return Err(AudioError::NoDevices);
    }

    devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.host.cmp(&b.host))
            .then_with(|| a.name.cmp(&b.name))
    });

    log::info!("Enumerated {} audio output devices", devices.len());
    Ok(devices)
}

/// Find a device by id, searching every host when no host is given
pub fn find_device_by_id(id: &DeviceId) -> AudioResult<cpal::Device> {
    let matches = |d: &cpal::Device| d.name().ok().as_deref() == Some(id.name.as_str());

    if let Some(host) = id.host.as_deref().and_then(host_by_name) {
        return host
            .output_devices()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?
            .find(matches)
            .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()));
    }

    cpal::available_hosts()
        .into_iter()
        .filter_map(|host_id| cpal::host_from_id(host_id).ok())
        .filter_map(|host| host.output_devices().ok())
        .find_map(|mut devices| devices.find(matches))
        .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()))
}

/// Default output device of the default host
pub fn default_output_device() -> AudioResult<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::NoDefaultDevice("host reports none".to_string()))
}
