use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use wavdeck::hal::PersistentStore;
use wavdeck::host::eeprom::FileEeprom;
use wavdeck::host::memory::RecordingLights;
use wavdeck::player::colors::ColorConfig;
use wavdeck::player::endpoint::ConfigEndpoint;

const SUBMIT: &str =
    "GET /submit?value1=255&value2=128&value3=0&value4=12&value5=34&value6=56 HTTP/1.1\r\n\r\n";

fn submit(endpoint: &ConfigEndpoint, store: &mut dyn PersistentStore, request: &'static str) -> String {
    let addr = endpoint.local_addr().unwrap();
    let client = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    });

    let mut served = false;
    for _ in 0..200 {
        if endpoint.poll(store).unwrap().is_some() || client.is_finished() {
            served = true;
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(served, "client was never served");
    client.join().unwrap()
}

#[test]
fn test_submitted_colours_survive_reboot() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wavdeck").join("eeprom.bin");
    let endpoint = ConfigEndpoint::bind("127.0.0.1:0").unwrap();

    let mut store = FileEeprom::open(&path).unwrap();
    let response = submit(&endpoint, &mut store, SUBMIT);
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("value6"));
    drop(store);

    // Power cycle: a fresh store reads the same bytes back
    let store = FileEeprom::open(&path).unwrap();
    let colors = ColorConfig::load(&store).unwrap();
    assert_eq!(colors.to_bytes(), [255, 128, 0, 12, 34, 56]);

    let mut lights = RecordingLights::default();
    colors.apply(&mut lights);
    assert_eq!(lights.pixels(), [(255, 128, 0), (12, 34, 56)]);
}

#[test]
fn test_rejected_submission_still_gets_the_form() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("eeprom.bin");
    let endpoint = ConfigEndpoint::bind("127.0.0.1:0").unwrap();

    let mut store = FileEeprom::open(&path).unwrap();
    let response = submit(
        &endpoint,
        &mut store,
        "GET /submit?value1=256&value2=1&value3=1&value4=1&value5=1&value6=1 HTTP/1.1\r\n\r\n",
    );
    assert!(response.contains("<form"));
    assert!(!path.exists());
}
