use tonic_build::manual::{Builder, Method, Service};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let mailbox = Service::builder()
        .name("Mailbox")
        .package("mesh")
        .method(
            Method::builder()
                .name("deliver")
                .route_name("Deliver")
                .input_type("crate::Envelope")
                .output_type("crate::Ack")
                .codec_path("tonic_prost::ProstCodec")
                .build(),
        )
        .build();

    Builder::new().compile(&[mailbox]);
}
