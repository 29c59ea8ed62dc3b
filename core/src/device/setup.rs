use super::{
    DeviceError, DeviceInfo, DeviceResult, DeviceSettings, GainMode, GainSetting, TunerDevice,
};
use log::{info, warn};

/// Resolves a selector as an index, then an exact, prefix or suffix serial match.
pub fn select_device(devices: &[DeviceInfo], selector: &str) -> DeviceResult<usize> {
    if devices.is_empty() {
        return Err(DeviceError::NoDevices);
    }
    for device in devices {
        info!(
            "  {}:  {}, {}, SN: {}",
            device.index, device.vendor, device.product, device.serial
        );
    }

    let matched = selector
        .parse::<usize>()
        .ok()
        .and_then(|index| devices.iter().find(|d| d.index == index))
        .or_else(|| devices.iter().find(|d| d.serial == selector))
        .or_else(|| devices.iter().find(|d| d.serial.starts_with(selector)))
        .or_else(|| devices.iter().find(|d| d.serial.ends_with(selector)));

    match matched {
        Some(device) => {
            info!("Using device {}: {}", device.index, device.product);
            Ok(device.index)
        }
        None => Err(DeviceError::NotFound(selector.to_string())),
    }
}

/// Supported gain closest to `target`; the earliest wins a tie.
pub fn nearest_gain(gains: &[i32], target: i32) -> Option<i32> {
    let mut nearest = *gains.first()?;
    for &gain in gains {
        if (target - gain).abs() < (target - nearest).abs() {
            nearest = gain;
        }
    }
    Some(nearest)
}

fn soft<T>(result: DeviceResult<T>, what: &str) {
    if let Err(err) = result {
        warn!("WARNING: failed to set {}: {}", what, err);
    }
}

/// Applies tuner settings, then the scan's sample rate and first frequency.
///
/// Only the rate and frequency are fatal; the rest proceed on a best-effort basis.
pub fn configure_device(
    device: &mut dyn TunerDevice,
    settings: &DeviceSettings,
    sample_rate: u32,
    first_frequency: u32,
) -> DeviceResult<()> {
    if settings.direct_sampling {
        soft(device.set_direct_sampling(true), "direct sampling mode");
    }
    if settings.offset_tuning {
        soft(device.set_offset_tuning(true), "offset tuning");
    }

    match settings.gain {
        GainSetting::Auto => {
            soft(device.set_gain_mode(GainMode::Auto), "automatic gain");
            info!("Tuner gain set to automatic.");
        }
        GainSetting::Manual { tenths_db } => match device.set_gain_mode(GainMode::Manual) {
            Ok(()) => {
                let gain = nearest_gain(&device.tuner_gains(), tenths_db).unwrap_or(tenths_db);
                match device.set_gain(gain) {
                    Ok(()) => info!("Tuner gain set to {:.2} dB.", gain as f64 / 10.0),
                    Err(err) => warn!("WARNING: failed to set tuner gain: {}", err),
                }
            }
            Err(err) => warn!("WARNING: failed to enable manual gain: {}", err),
        },
    }

    if settings.ppm != 0 {
        match device.set_frequency_correction(settings.ppm) {
            Ok(()) => info!("Tuner error set to {} ppm.", settings.ppm),
            Err(err) => warn!("WARNING: failed to set ppm error: {}", err),
        }
    }

    soft(device.reset_buffer(), "buffer reset");

    device.set_sample_rate(sample_rate)?;
    info!("Sampling at {} S/s.", sample_rate);
    device.set_center_frequency(first_frequency)?;
    info!("Tuned to {} Hz.", first_frequency);
    Ok(())
}
