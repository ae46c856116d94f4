//! Common test utilities: template fixtures and graph builders

#![allow(dead_code)]

use serde_json::Value;
use stackgraph::document::{self, Format, Template};
use stackgraph::{GraphStore, GroupId, NodeId};

/// `infra`: a topic, a subscription referencing it, and a queue policy
/// referencing both by attribute
pub const INFRA: &str = r#"
AWSTemplateFormatVersion: "2010-09-09"
Resources:
  Queue:
    Type: AWS::SQS::Queue
  Topic:
    Type: AWS::SNS::Topic
    DeletionPolicy: Retain
    Properties:
      TopicName: orders
  Subscription:
    Type: AWS::SNS::Subscription
    DependsOn: Queue
    Properties:
      TopicArn: !Ref Topic
      Endpoint: !GetAtt Queue.Arn
      Protocol: sqs
  Policy:
    Type: AWS::SQS::QueuePolicy
    Properties:
      Queues: [!Ref Queue]
      PolicyDocument:
        Statement:
          - Effect: Allow
            Resource: !GetAtt Queue.Arn
            Condition:
              ArnEquals:
                aws:SourceArn: !Sub "${Topic}"
"#;

/// `services`: an application consuming the topic through an export
pub const SERVICES: &str = r#"
Resources:
  Worker:
    Type: AWS::Lambda::Function
    Properties:
      Environment:
        Variables:
          TOPIC: !ImportValue infra-orders-topic
"#;

/// `infra` with an explicit export of the topic for `services`
pub const INFRA_WITH_EXPORT: &str = r#"
Resources:
  Topic:
    Type: AWS::SNS::Topic
Outputs:
  OrdersTopic:
    Value: !Ref Topic
    Export:
      Name: infra-orders-topic
"#;

pub fn id(group: &str, name: &str) -> NodeId {
    NodeId::new(group, name)
}

pub fn yaml(text: &str) -> Template {
    document::parse_template(text, Format::Yaml).expect("fixture parses")
}

/// Ingest `(group, yaml)` pairs into a fresh store
pub fn build(documents: &[(&str, &str)]) -> GraphStore {
    let documents: Vec<(GroupId, Template)> = documents
        .iter()
        .map(|(group, text)| (GroupId::from(*group), yaml(text)))
        .collect();
    let mut store = GraphStore::new();
    document::ingest(&mut store, &documents).expect("fixtures ingest");
    store
}

/// Generate `group`'s template as JSON for structural comparison
pub fn generated(store: &GraphStore, group: &str) -> Value {
    let template = document::generate(store, &GroupId::from(group));
    serde_json::to_value(&template).expect("template serializes")
}
