#![no_main]

use cilgraph::metadata::signatures::{
    encode_type_signature, parse_field_signature, parse_local_var_signature,
    parse_method_signature, parse_method_spec_signature, parse_property_signature,
    parse_type_spec_signature,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = parse_method_signature(data);
    let _ = parse_field_signature(data);
    let _ = parse_property_signature(data);
    let _ = parse_local_var_signature(data);
    let _ = parse_method_spec_signature(data);

    if let Ok(signature) = parse_type_spec_signature(data) {
        let _ = encode_type_signature(&signature);
    }
});
