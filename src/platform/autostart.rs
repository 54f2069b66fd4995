// Platform-specific "run at login" registration

use anyhow::{Context, Result};
use std::path::Path;

const APP_NAME: &str = "SimpleDiskMonitor";

/// Register or unregister the monitor to start at login.
pub fn set_autostart(enable: bool) -> Result<()> {
    let exe = std::env::current_exe().with_context(|| "Could not determine executable path")?;
    set_autostart_for(&exe, enable)
}

/// Register (Windows implementation)
#[cfg(windows)]
fn set_autostart_for(exe: &Path, enable: bool) -> Result<()> {
    use winreg::enums::*;
    use winreg::RegKey;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let run = hkcu
        .open_subkey_with_flags(
            r"Software\Microsoft\Windows\CurrentVersion\Run",
            KEY_READ | KEY_WRITE,
        )
        .with_context(|| "Failed to open registry key")?;

    if enable {
        let command = format!("\"{}\" run", exe.display());
        run.set_value(APP_NAME, &command)
            .with_context(|| "Failed to write autostart entry to registry")?;
        log::info!("Added to startup programs");
    } else {
        match run.delete_value(APP_NAME) {
            Ok(()) => log::info!("Removed from startup programs"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| "Failed to remove autostart entry"),
        }
    }

    Ok(())
}

/// Register (Linux implementation, XDG autostart)
#[cfg(target_os = "linux")]
fn set_autostart_for(exe: &Path, enable: bool) -> Result<()> {
    let dir = dirs::config_dir()
        .with_context(|| "Could not determine config directory")?
        .join("autostart");
    write_desktop_entry(&dir, exe, enable)
}

#[cfg(not(any(windows, target_os = "linux")))]
fn set_autostart_for(_exe: &Path, _enable: bool) -> Result<()> {
    log::warn!("Autostart is not supported on this platform");
    Ok(())
}

/// Contents of the XDG `.desktop` file that launches the monitor.
pub fn desktop_entry(exe: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={}\n\
         Comment=Disk usage alerts\n\
         Exec=\"{}\" run\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        APP_NAME,
        exe.display()
    )
}

/// Create or remove `sdm.desktop` inside `dir`.
pub fn write_desktop_entry(dir: &Path, exe: &Path, enable: bool) -> Result<()> {
    let entry = dir.join("sdm.desktop");

    if enable {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create autostart directory: {:?}", dir))?;
        std::fs::write(&entry, desktop_entry(exe))
            .with_context(|| format!("Failed to write autostart entry: {:?}", entry))?;
        log::info!("Added to startup programs: {:?}", entry);
    } else if entry.exists() {
        std::fs::remove_file(&entry)
            .with_context(|| format!("Failed to remove autostart entry: {:?}", entry))?;
        log::info!("Removed from startup programs");
    }

    Ok(())
}
