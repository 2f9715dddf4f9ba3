//! Wi-Fi station bring-up on esp-radio and embassy-net

use alloc::string::String;
use alloc::vec::Vec;

use doorbell_core::wifi::{AccessPoint, Connectivity, WifiRadio};
use embassy_executor::{SpawnError, Spawner};
use embassy_net::{Runner, Stack, StackResources};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::wifi::{ClientConfig, ModeConfig, ScanConfig, WifiController, WifiDevice, WifiError};
use log::{debug, info, warn};
use static_cell::StaticCell;
use thiserror_no_std::Error;

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

#[derive(Error, Debug)]
pub enum WifiInitError {
    #[error("radio init failed: {0:?}")]
    Radio(esp_radio::InitializationError),
    #[error("Wi-Fi driver init failed: {0:?}")]
    Driver(WifiError),
    #[error("network task spawn failed: {0:?}")]
    Spawn(SpawnError),
}

/// Bring up the radio and the DHCP network stack, and spawn the stack runner.
///
/// The station is left stopped; it is configured and started on the first
/// scan or connection attempt.
pub fn init(spawner: &Spawner, wifi: WIFI<'static>) -> Result<EspRadio, WifiInitError> {
    let radio = RADIO.init(esp_radio::init().map_err(WifiInitError::Radio)?);
    let (controller, interfaces) =
        esp_radio::wifi::new(radio, wifi, Default::default()).map_err(WifiInitError::Driver)?;

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner).map_err(WifiInitError::Spawn)?);

    Ok(EspRadio { controller, stack })
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Station-mode radio plus the network stack that reports its address.
pub struct EspRadio {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl EspRadio {
    /// Handle to the network stack, shared with the HTTP transport.
    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }

    fn is_started(&self) -> bool {
        matches!(self.controller.is_started(), Ok(true))
    }

    async fn ensure_started(&mut self) -> Result<(), WifiError> {
        if !self.is_started() {
            self.controller
                .set_config(&ModeConfig::Client(ClientConfig::default()))?;
            self.controller.start_async().await?;
            info!("Wi-Fi station started");
        }
        Ok(())
    }
}

impl WifiRadio for EspRadio {
    type Error = WifiError;

    async fn scan(&mut self) -> Result<Vec<AccessPoint>, WifiError> {
        self.ensure_started().await?;
        let found = self
            .controller
            .scan_with_config_async(ScanConfig::default())
            .await?;

        debug!("scan found {} access points", found.len());
        Ok(found
            .iter()
            .map(|ap| AccessPoint::new(ap.ssid.as_str(), ap.signal_strength))
            .collect())
    }

    async fn disconnect(&mut self) {
        if !matches!(self.controller.is_connected(), Ok(true)) {
            return;
        }
        if let Err(e) = self.controller.disconnect_async().await {
            warn!("Wi-Fi disconnect failed: {:?}", e);
        }
    }

    async fn begin(&mut self, ssid: &str, password: &str) -> Result<(), WifiError> {
        let config = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(String::from(ssid))
                .with_password(String::from(password)),
        );
        self.controller.set_config(&config)?;
        if !self.is_started() {
            self.controller.start_async().await?;
        }

        info!("associating with '{}'", ssid);
        self.controller.connect()
    }

    fn connectivity(&mut self) -> Connectivity {
        if !matches!(self.controller.is_connected(), Ok(true)) {
            return Connectivity::Disconnected;
        }
        match self.stack.config_v4() {
            Some(config) => Connectivity::Connected(config.address.address()),
            None => Connectivity::Disconnected,
        }
    }
}
