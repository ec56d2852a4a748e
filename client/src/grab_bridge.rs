use std::collections::BTreeMap;

use log::debug;

use colocate_shared::{
    EventStream, GrabFrame, Manipulator, ObjectId, PointerEvent, PointerEventKind, Pose,
    PoseSample, Subscription, Vec3,
};

use crate::Client;

struct ActiveGrab {
    manipulator: Manipulator,
    /// Grab points by pointer, in the order they began
    pointers: Vec<(u32, Pose)>,
    granted: bool,
}

impl ActiveGrab {
    fn points(&self) -> Vec<Pose> {
        self.pointers.iter().map(|(_, pose)| *pose).collect()
    }
}

/// Turns pointer interactions into authority requests and published poses.
/// Selecting an object requests it, the object's manipulator moves it while
/// it is held, and letting go of every grab point releases it.
pub struct GrabBridge {
    pointer_events: Subscription<PointerEvent>,
    grabs: BTreeMap<ObjectId, ActiveGrab>,
    chest: Vec3,
    dominant_hand: Vec3,
}

impl GrabBridge {
    pub fn new(pointer_events: &EventStream<PointerEvent>) -> Self {
        Self {
            pointer_events: pointer_events.subscribe(),
            grabs: BTreeMap::new(),
            chest: Vec3::ZERO,
            dominant_hand: Vec3::ZERO,
        }
    }

    /// Body points used by two-handed manipulators
    pub fn set_body(&mut self, chest: Vec3, dominant_hand: Vec3) {
        self.chest = chest;
        self.dominant_hand = dominant_hand;
    }

    pub fn is_grabbing(&self, object: &ObjectId) -> bool {
        self.grabs.contains_key(object)
    }

    /// Handle queued pointer events, then move every held object. Call once
    /// per simulation step, before `Client::tick`.
    pub fn update(&mut self, client: &mut Client) {
        for event in self.pointer_events.drain() {
            self.apply(client, event);
        }

        let (chest, dominant_hand) = (self.chest, self.dominant_hand);
        let mut lost = Vec::new();
        for (object, grab) in self.grabs.iter_mut() {
            if !client.holds(object) {
                if grab.granted {
                    lost.push(*object);
                }
                continue;
            }
            let Some(target) = client.object(object).map(|remote| remote.pose) else {
                continue;
            };
            let points = grab.points();
            let frame = GrabFrame {
                target,
                grabs: &points,
                chest,
                dominant_hand,
            };
            if !grab.granted {
                grab.granted = true;
                grab.manipulator.begin(&frame);
            }
            if let Some(output) = grab.manipulator.update(&frame) {
                let sample = PoseSample::from_pose(output.pose, client.clock());
                client.publish(object, sample, output.inputs);
            }
        }

        for object in lost {
            debug!("Lost {} while grabbing it", object);
            if let Some(mut grab) = self.grabs.remove(&object) {
                grab.manipulator.end();
            }
        }
    }

    fn apply(&mut self, client: &mut Client, event: PointerEvent) {
        let object = event.object;
        match event.kind {
            PointerEventKind::Hover => {}
            PointerEventKind::Select => {
                let Some(kind) = client.kind_of(&object) else {
                    debug!("Ignoring grab of unknown {}", object);
                    return;
                };
                let grab = self.grabs.entry(object).or_insert_with(|| ActiveGrab {
                    manipulator: Manipulator::for_kind(kind),
                    pointers: Vec::new(),
                    granted: false,
                });
                if grab.pointers.iter().all(|(pointer, _)| *pointer != event.pointer) {
                    grab.pointers.push((event.pointer, event.pose));
                }
                if grab.granted {
                    self.rebegin(client, &object);
                } else {
                    client.request_hold(&object);
                }
            }
            PointerEventKind::Move => {
                if let Some(grab) = self.grabs.get_mut(&object) {
                    for (pointer, pose) in grab.pointers.iter_mut() {
                        if *pointer == event.pointer {
                            *pose = event.pose;
                        }
                    }
                }
            }
            PointerEventKind::Unselect | PointerEventKind::Cancel => {
                let Some(grab) = self.grabs.get_mut(&object) else {
                    return;
                };
                grab.pointers.retain(|(pointer, _)| *pointer != event.pointer);
                if !grab.pointers.is_empty() {
                    self.rebegin(client, &object);
                    return;
                }

                if let Some(mut grab) = self.grabs.remove(&object) {
                    let parked = grab.manipulator.end();
                    let pose = client.object(&object).map(|remote| remote.pose);
                    if let (Some(inputs), Some(pose)) = (parked, pose) {
                        let sample = PoseSample::from_pose(pose, client.clock());
                        client.publish(&object, sample, Some(inputs));
                    }
                }
                client.release(&object);
            }
        }
    }

    /// Grab points changed: capture offsets again from the current pose
    fn rebegin(&mut self, client: &Client, object: &ObjectId) {
        let Some(grab) = self.grabs.get_mut(object) else {
            return;
        };
        let Some(target) = client.object(object).map(|remote| remote.pose) else {
            return;
        };
        let points = grab.points();
        grab.manipulator.begin(&GrabFrame {
            target,
            grabs: &points,
            chest: self.chest,
            dominant_hand: self.dominant_hand,
        });
    }
}
