#![no_main]

use cilgraph::metadata::method::CilMethodBody;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut body) = CilMethodBody::read(data, None) {
        let _ = body.verify_labels();
        let _ = body.compute_max_stack();
        let _ = body.build().and_then(|raw| raw.write());
    }
});
