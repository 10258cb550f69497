//! Descriptor fixtures for unit tests.

use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};
use std::path::PathBuf;

fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        json_name: Some(name.into()),
        ..Default::default()
    }
}

fn bool_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        r#type: Some(Type::Bool as i32),
        ..string_field(name, number)
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.into()),
        field: fields,
        ..Default::default()
    }
}

fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.into()),
        input_type: Some(format!(".helloworld.{input}")),
        output_type: Some(format!(".helloworld.{output}")),
        ..Default::default()
    }
}

/// `helloworld.Greeter` with `SayHello`, `Fail` and `Nothing`.
pub fn descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("helloworld.proto".into()),
            package: Some("helloworld".into()),
            message_type: vec![
                message(
                    "HelloRequest",
                    vec![
                        string_field("query", 1),
                        string_field("test", 2),
                        string_field("name", 3),
                        bool_field("excited", 4),
                    ],
                ),
                message("HelloReply", vec![string_field("query", 1)]),
                message("Empty", vec![]),
            ],
            service: vec![ServiceDescriptorProto {
                name: Some("Greeter".into()),
                method: vec![
                    method("SayHello", "HelloRequest", "HelloReply"),
                    method("Fail", "HelloRequest", "HelloReply"),
                    method("Nothing", "HelloRequest", "Empty"),
                ],
                ..Default::default()
            }],
            syntax: Some("proto3".into()),
            ..Default::default()
        }],
    }
}

pub fn pool() -> DescriptorPool {
    DescriptorPool::decode(descriptor_set().encode_to_vec().as_slice()).unwrap()
}

/// Fresh directory containing `helloworld.bin`.
pub fn schema_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rpc-gateway-schema-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("helloworld.bin"), descriptor_set().encode_to_vec()).unwrap();
    dir
}
